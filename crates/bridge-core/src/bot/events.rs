//! Per-event handling inside a connected session.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::canned;
use crate::decision;
use crate::persona::{INTRODUCTIONS, private_reply};
use crate::random::pick;
use crate::transport::{ChatTransport, Outbound, TransportEvent};

use super::Bot;
use super::settings::collision_nickname;

impl<T: ChatTransport> Bot<T> {
    pub(super) async fn handle_event(
        &mut self,
        event: TransportEvent,
        outbound: &Outbound,
        session: &CancellationToken,
    ) {
        match event {
            TransportEvent::Welcome => self.on_welcome(outbound, session).await,
            TransportEvent::NicknameInUse => self.on_nickname_in_use(outbound).await,
            TransportEvent::PublicMessage {
                sender,
                channel,
                text,
            } => self.on_public_message(sender, &channel, &text, outbound, session),
            TransportEvent::PrivateMessage { sender, text } => {
                self.on_private_message(sender, &text, outbound, session)
            }
            // Ends the session; handled by the caller.
            TransportEvent::Disconnected { .. } => {}
        }
    }

    async fn on_welcome(&mut self, outbound: &Outbound, session: &CancellationToken) {
        let channel = self.identity.channel.clone();
        tracing::info!(
            nickname = %self.identity.nickname,
            %channel,
            "Registered with server, joining channel"
        );

        if let Err(e) = outbound.join(&channel).await {
            tracing::warn!(error = %e, %channel, "Failed to send JOIN");
            return;
        }

        let intro = pick(self.rng.as_mut(), &INTRODUCTIONS)
            .copied()
            .unwrap_or(INTRODUCTIONS[0]);
        self.schedule_say(session, outbound, channel, intro.to_string(), self.settings.intro_delay);
    }

    async fn on_nickname_in_use(&mut self, outbound: &Outbound) {
        let replacement = collision_nickname(&self.identity.nickname, self.rng.as_mut());
        tracing::warn!(
            taken = %self.identity.nickname,
            %replacement,
            "Nickname in use, switching"
        );
        self.identity.rename(replacement.clone());

        if let Err(e) = outbound.change_nick(&replacement).await {
            tracing::warn!(error = %e, "Failed to send NICK");
        }
    }

    fn on_public_message(
        &mut self,
        sender: String,
        channel: &str,
        text: &str,
        outbound: &Outbound,
        session: &CancellationToken,
    ) {
        if !channel.eq_ignore_ascii_case(&self.identity.channel) {
            tracing::debug!(%channel, "Ignoring message for another channel");
            return;
        }

        let text = text.trim();
        self.memory.record(sender.clone(), text);

        let verdict = decision::evaluate(
            text,
            &sender,
            &self.identity,
            &self.settings.policy,
            self.rng.as_mut(),
        );
        tracing::debug!(
            %sender,
            trigger = ?verdict.trigger,
            respond = verdict.respond,
            "Evaluated channel message"
        );
        if !verdict.respond {
            return;
        }

        // Drawn here so the spawned task needs no random source of its own.
        let fallback = canned::select(text, self.rng.as_mut());
        let delay = self.settings.reply_delay.draw(self.rng.as_mut());

        let responder = self.responder.clone();
        let outbound = outbound.clone();
        let channel = self.identity.channel.clone();
        let text = text.to_string();
        let token = session.clone();

        self.tracker.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!(%sender, "Pending reply cancelled");
                }
                _ = async {
                    let reply = responder.reply(&sender, &text, fallback).await;
                    tokio::time::sleep(delay).await;
                    match outbound.say(&channel, &reply.text).await {
                        Ok(()) => tracing::info!(
                            %sender,
                            source = ?reply.source,
                            delay_ms = delay.as_millis() as u64,
                            "Replied in channel"
                        ),
                        Err(e) => tracing::debug!(error = %e, "Reply not delivered"),
                    }
                } => {}
            }
        });
    }

    fn on_private_message(
        &mut self,
        sender: String,
        text: &str,
        outbound: &Outbound,
        session: &CancellationToken,
    ) {
        let text = text.trim().to_string();
        tracing::info!(%sender, "Private message received");

        let fallback = canned::select(&text, self.rng.as_mut());
        let responder = self.responder.clone();
        let outbound = outbound.clone();
        let label = self.identity.label.clone();
        let token = session.clone();

        self.tracker.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!(%sender, "Pending private reply cancelled");
                }
                _ = async {
                    let reply = responder.reply(&sender, &text, fallback).await;
                    let line = private_reply(&label, &reply.text);
                    if let Err(e) = outbound.say(&sender, &line).await {
                        tracing::debug!(error = %e, "Private reply not delivered");
                    }
                } => {}
            }
        });
    }

    /// Send `text` to `target` after `delay`, unless the session ends first.
    fn schedule_say(
        &self,
        session: &CancellationToken,
        outbound: &Outbound,
        target: String,
        text: String,
        delay: Duration,
    ) {
        let outbound = outbound.clone();
        let token = session.clone();
        self.tracker.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    if let Err(e) = outbound.say(&target, &text).await {
                        tracing::debug!(error = %e, "Deferred message not delivered");
                    }
                }
            }
        });
    }
}
