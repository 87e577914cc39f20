//! IRC chat transport.
//!
//! Opens a TCP connection, registers, and then runs two tasks per
//! connection: a reader that turns server lines into [`TransportEvent`]s
//! (answering PING itself) and a writer that serialises outbound commands.
//! Both end when the connection closes or the session is dropped.

pub mod message;

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::mpsc;

use bridge_core::transport::{ChatSession, ChatTransport, OutboundCommand, TransportEvent, TransportSide};
use bridge_types::config::BotConfig;
use bridge_types::error::TransportError;
use bridge_types::identity::ServerEndpoint;

use self::message::{IrcMessage, MAX_LINE_BYTES, is_channel, render, to_wire};

const SESSION_CHANNEL_CAPACITY: usize = 64;
const READ_BUFFER_CAPACITY: usize = 1024;
/// Inbound lines longer than this are discarded; leaves room for IRCv3 tags.
const MAX_INBOUND_LINE_BYTES: usize = MAX_LINE_BYTES * 16;
const CTCP_DELIM: char = '\x01';
const CTCP_VERSION: &str = concat!("consciousness-bridge ", env!("CARGO_PKG_VERSION"));

/// Connection settings that do not change across reconnects.
pub struct IrcSettings {
    pub realname: String,
    pub password: Option<SecretString>,
    pub connect_timeout: Duration,
}

// Does not derive Debug so the server password cannot end up in logs.
pub struct IrcTransport {
    settings: IrcSettings,
}

impl IrcTransport {
    pub fn new(settings: IrcSettings) -> Self {
        Self { settings }
    }

    /// Build from the bot configuration; the password is moved out of it.
    pub fn from_config(config: &mut BotConfig) -> Self {
        Self::new(IrcSettings {
            realname: config.realname.clone(),
            password: config.password.take(),
            connect_timeout: config.connect_timeout(),
        })
    }
}

impl ChatTransport for IrcTransport {
    async fn connect(
        &self,
        endpoint: &ServerEndpoint,
        nickname: &str,
    ) -> Result<ChatSession, TransportError> {
        let addr = endpoint.to_string();

        let stream = tokio::time::timeout(
            self.settings.connect_timeout,
            TcpStream::connect((endpoint.host.as_str(), endpoint.port)),
        )
        .await
        .map_err(|_| TransportError::ConnectTimeout(addr.clone()))?
        .map_err(|e| TransportError::Connect {
            endpoint: addr.clone(),
            message: e.to_string(),
        })?;

        let (reader, mut writer) = stream.into_split();

        if let Some(password) = &self.settings.password {
            write_line(&mut writer, &format!("PASS {}", password.expose_secret())).await?;
        }
        write_line(&mut writer, &format!("NICK {nickname}")).await?;
        write_line(
            &mut writer,
            &format!("USER {nickname} 0 * :{}", self.settings.realname),
        )
        .await?;

        tracing::debug!(server = %addr, %nickname, "Registration sent");

        let (session, side) = ChatSession::channel(SESSION_CHANNEL_CAPACITY);
        let TransportSide { events, commands } = side;
        let (control_tx, control_rx) = mpsc::channel(SESSION_CHANNEL_CAPACITY);

        tokio::spawn(read_loop(reader, events, control_tx));
        tokio::spawn(write_loop(writer, commands, control_rx));

        Ok(session)
    }
}

async fn write_line(writer: &mut OwnedWriteHalf, line: &str) -> Result<(), TransportError> {
    writer.write_all(to_wire(line).as_bytes()).await?;
    Ok(())
}

/// What the reader does with one inbound line.
#[derive(Debug, PartialEq, Eq)]
enum Inbound {
    Event(TransportEvent),
    Pong(String),
    /// A raw line to send straight back, e.g. a CTCP answer.
    Reply(String),
    Closed(String),
    Ignore,
}

fn interpret(message: &IrcMessage) -> Inbound {
    match message.command.as_str() {
        "PING" => Inbound::Pong(message.last_param().unwrap_or_default().to_string()),
        "001" => Inbound::Event(TransportEvent::Welcome),
        "433" => Inbound::Event(TransportEvent::NicknameInUse),
        "PRIVMSG" => {
            let (Some(sender), Some(target), Some(text)) =
                (message.nick(), message.param(0), message.param(1))
            else {
                return Inbound::Ignore;
            };
            if let Some(query) = ctcp_payload(text) {
                return answer_ctcp(sender, query);
            }
            let event = if is_channel(target) {
                TransportEvent::PublicMessage {
                    sender: sender.to_string(),
                    channel: target.to_string(),
                    text: text.to_string(),
                }
            } else {
                TransportEvent::PrivateMessage {
                    sender: sender.to_string(),
                    text: text.to_string(),
                }
            };
            Inbound::Event(event)
        }
        "ERROR" => Inbound::Closed(
            message
                .last_param()
                .unwrap_or("server sent ERROR")
                .to_string(),
        ),
        _ => Inbound::Ignore,
    }
}

/// The body of a CTCP request (`\x01VERSION\x01`), if `text` is one.
fn ctcp_payload(text: &str) -> Option<&str> {
    let body = text.strip_prefix(CTCP_DELIM)?;
    Some(body.strip_suffix(CTCP_DELIM).unwrap_or(body))
}

/// VERSION and PING get a NOTICE back; ACTION and the rest are dropped.
fn answer_ctcp(sender: &str, query: &str) -> Inbound {
    let (command, argument) = query.split_once(' ').unwrap_or((query, ""));
    let reply = match command.to_ascii_uppercase().as_str() {
        "VERSION" => format!("VERSION {CTCP_VERSION}"),
        "PING" => format!("PING {argument}"),
        _ => return Inbound::Ignore,
    };
    Inbound::Reply(format!(
        "NOTICE {sender} :{CTCP_DELIM}{}{CTCP_DELIM}",
        reply.trim_end()
    ))
}

async fn read_loop(
    reader: OwnedReadHalf,
    events: mpsc::Sender<TransportEvent>,
    control: mpsc::Sender<String>,
) {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::with_capacity(READ_BUFFER_CAPACITY);

    // Set while skipping the rest of a line that overran the limit.
    let mut oversized = false;

    let reason = loop {
        let mut limited = (&mut reader).take(MAX_INBOUND_LINE_BYTES as u64);
        let read = tokio::select! {
            _ = events.closed() => return,
            read = limited.read_until(b'\n', &mut buf) => read,
        };

        match read {
            Ok(0) => break "connection closed by server".to_string(),
            Ok(_) => {
                let complete = buf.ends_with(b"\n");
                if !complete && buf.len() >= MAX_INBOUND_LINE_BYTES {
                    if !oversized {
                        tracing::warn!(limit = MAX_INBOUND_LINE_BYTES, "Dropping oversized IRC line");
                    }
                    oversized = true;
                    buf.clear();
                    continue;
                }
                if oversized {
                    oversized = !complete;
                    buf.clear();
                    continue;
                }

                let line = String::from_utf8_lossy(&buf).into_owned();
                buf.clear();

                let Some(message) = IrcMessage::parse(&line) else {
                    continue;
                };
                tracing::trace!(command = %message.command, "IRC line received");

                match interpret(&message) {
                    Inbound::Event(event) => {
                        if events.send(event).await.is_err() {
                            return;
                        }
                    }
                    Inbound::Pong(token) => {
                        let _ = control.send(format!("PONG :{token}")).await;
                    }
                    Inbound::Reply(line) => {
                        let _ = control.send(line).await;
                    }
                    Inbound::Closed(reason) => break reason,
                    Inbound::Ignore => {}
                }
            }
            Err(e) => break format!("read error: {e}"),
        }
    };

    tracing::debug!(%reason, "IRC reader finished");
    let _ = events.send(TransportEvent::Disconnected { reason }).await;
}

async fn write_loop(
    mut writer: OwnedWriteHalf,
    mut commands: mpsc::Receiver<OutboundCommand>,
    mut control: mpsc::Receiver<String>,
) {
    loop {
        let line = tokio::select! {
            Some(line) = control.recv() => line,
            command = commands.recv() => match command {
                Some(command) => render(&command),
                None => break,
            },
        };

        if let Err(e) = write_line(&mut writer, &line).await {
            tracing::debug!(error = %e, "IRC writer finished");
            break;
        }
    }

    let _ = writer.shutdown().await;
}
