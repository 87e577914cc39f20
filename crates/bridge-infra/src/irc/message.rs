//! IRC line parsing and rendering.

use bridge_core::transport::OutboundCommand;

/// Maximum IRC line length in bytes, including the trailing CRLF.
pub const MAX_LINE_BYTES: usize = 512;

/// One parsed protocol line: `[@tags] [:prefix] COMMAND params [:trailing]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrcMessage {
    pub prefix: Option<String>,
    pub command: String,
    pub params: Vec<String>,
}

impl IrcMessage {
    /// Parse a single line. Trailing CR/LF is ignored; tags are skipped.
    /// Returns `None` for blank or command-less lines.
    pub fn parse(line: &str) -> Option<Self> {
        let mut rest = line.trim_end_matches(['\r', '\n']);

        if rest.starts_with('@') {
            let (_, after) = rest.split_once(' ')?;
            rest = after.trim_start_matches(' ');
        }

        let mut prefix = None;
        if let Some(stripped) = rest.strip_prefix(':') {
            let (p, after) = stripped.split_once(' ')?;
            prefix = Some(p.to_string());
            rest = after.trim_start_matches(' ');
        }

        let (command, mut rest) = match rest.split_once(' ') {
            Some((command, after)) => (command, after),
            None => (rest, ""),
        };
        if command.is_empty() {
            return None;
        }

        let mut params = Vec::new();
        loop {
            rest = rest.trim_start_matches(' ');
            if rest.is_empty() {
                break;
            }
            if let Some(trailing) = rest.strip_prefix(':') {
                params.push(trailing.to_string());
                break;
            }
            match rest.split_once(' ') {
                Some((param, after)) => {
                    params.push(param.to_string());
                    rest = after;
                }
                None => {
                    params.push(rest.to_string());
                    break;
                }
            }
        }

        Some(Self {
            prefix,
            command: command.to_ascii_uppercase(),
            params,
        })
    }

    /// Nickname part of the prefix (`nick!user@host`).
    pub fn nick(&self) -> Option<&str> {
        let prefix = self.prefix.as_deref()?;
        let nick = prefix.split(['!', '@']).next().unwrap_or(prefix);
        (!nick.is_empty()).then_some(nick)
    }

    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    pub fn last_param(&self) -> Option<&str> {
        self.params.last().map(String::as_str)
    }
}

/// Channel targets start with `#` or `&`.
pub fn is_channel(target: &str) -> bool {
    target.starts_with(['#', '&'])
}

/// Render an outbound command as a protocol line (without CRLF).
pub fn render(command: &OutboundCommand) -> String {
    match command {
        OutboundCommand::Join { channel } => format!("JOIN {channel}"),
        OutboundCommand::Say { target, text } => format!("PRIVMSG {target} :{text}"),
        OutboundCommand::ChangeNick { nickname } => format!("NICK {nickname}"),
        OutboundCommand::Quit { reason } => format!("QUIT :{reason}"),
    }
}

/// Strip embedded CR/LF/NUL and cut the line so that, with CRLF appended,
/// it fits in [`MAX_LINE_BYTES`]. Truncation respects UTF-8 boundaries.
pub fn to_wire(line: &str) -> String {
    let mut clean: String = line
        .chars()
        .filter(|c| !matches!(c, '\r' | '\n' | '\0'))
        .collect();

    let limit = MAX_LINE_BYTES - 2;
    if clean.len() > limit {
        let mut cut = limit;
        while !clean.is_char_boundary(cut) {
            cut -= 1;
        }
        clean.truncate(cut);
    }

    clean.push_str("\r\n");
    clean
}
