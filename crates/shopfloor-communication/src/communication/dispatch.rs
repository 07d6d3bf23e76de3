//! Command dispatch
//!
//! Maps an operator intent for a target machine to a formatted wire command
//! and publishes it on that machine's command topic. The emergency stop is
//! the single deliberate exception to per-machine addressing: it goes to the
//! broadcast topic so it reaches the whole fleet no matter which machine the
//! operator had selected.
//!
//! Dispatch refuses to publish while the broker link is down. The caller
//! surfaces that as a warning; there is no automatic retry, because a stale
//! motion command arriving after a reconnect is worse than a dropped one.

use crate::communication::{mqtt::MqttLink, topics};
use crate::firmware::fluidnc;
use rumqttc::QoS;
use shopfloor_core::{Axis, ConnectionError, Result};

/// The closed set of operator intents
#[derive(Debug, Clone, PartialEq)]
pub enum CommandIntent {
    /// Incremental move along one axis, signed distance in millimeters
    Jog {
        /// Axis to move
        axis: Axis,
        /// Signed distance in millimeters
        distance_mm: f64,
    },
    /// Run the homing cycle
    Home,
    /// Immediate, non-destructive pause of in-progress motion
    FeedHold,
    /// Halt and reset every machine on the bus
    EmergencyStopAll,
    /// Assign a job file for the machine to fetch
    SelectFile(String),
}

/// Publishes operator commands over the broker link
#[derive(Clone)]
pub struct CommandDispatcher {
    link: MqttLink,
    jog_feed_rate: u32,
}

impl CommandDispatcher {
    /// Create a dispatcher publishing through `link`
    ///
    /// `jog_feed_rate` is the feed applied to every jog command, in mm/min.
    pub fn new(link: MqttLink, jog_feed_rate: u32) -> Self {
        Self {
            link,
            jog_feed_rate,
        }
    }

    /// Format `intent` for `target_id` and publish it
    ///
    /// Returns the wire command that was published. Fails without publishing
    /// when the transport is disconnected.
    pub async fn dispatch(&self, target_id: usize, intent: CommandIntent) -> Result<String> {
        if !self.link.status.is_connected() {
            return Err(ConnectionError::NotConnected.into());
        }

        let command = self.format_intent(&intent);
        let topic = match intent {
            CommandIntent::EmergencyStopAll => topics::broadcast_topic(&self.link.root),
            _ => topics::command_topic(&self.link.root, target_id),
        };

        self.link
            .client
            .publish(&topic, QoS::AtLeastOnce, false, command.clone())
            .await
            .map_err(|e| ConnectionError::PublishFailed {
                reason: e.to_string(),
            })?;

        tracing::info!(topic = %topic, command = %command, "command dispatched");
        Ok(command)
    }

    /// The wire form of an intent
    pub fn format_intent(&self, intent: &CommandIntent) -> String {
        match intent {
            CommandIntent::Jog { axis, distance_mm } => {
                fluidnc::format_jog(*axis, *distance_mm, self.jog_feed_rate)
            }
            CommandIntent::Home => fluidnc::format_home(),
            CommandIntent::FeedHold => fluidnc::format_feed_hold(),
            CommandIntent::EmergencyStopAll => fluidnc::format_soft_reset(),
            CommandIntent::SelectFile(name) => fluidnc::format_file_select(name),
        }
    }
}
