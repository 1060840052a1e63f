//! Channel Router
//!
//! Front and rear plate previews are mutually exclusive: routing a plate to
//! one channel always blanks the other, whatever it was showing.

use crate::plate::{Channel, PlateKey};

#[derive(Debug, Clone, Default)]
pub struct ChannelRouter {
    front: Option<PlateKey>,
    rear: Option<PlateKey>,
    front_hit: bool,
    rear_hit: bool,
}

impl ChannelRouter {
    pub fn new() -> Self {
        ChannelRouter::default()
    }

    pub fn route(&mut self, key: PlateKey, channel: Channel) {
        log::trace!("Routing {} to {}", key, channel);
        *self.slot_mut(channel) = Some(key);
        *self.slot_mut(channel.opposite()) = None;
    }

    pub fn preview(&self, channel: Channel) -> Option<&PlateKey> {
        match channel {
            Channel::Front => self.front.as_ref(),
            Channel::Rear => self.rear.as_ref(),
        }
    }

    fn slot_mut(&mut self, channel: Channel) -> &mut Option<PlateKey> {
        match channel {
            Channel::Front => &mut self.front,
            Channel::Rear => &mut self.rear,
        }
    }

    pub fn is_hit(&self, channel: Channel) -> bool {
        match channel {
            Channel::Front => self.front_hit,
            Channel::Rear => self.rear_hit,
        }
    }

    pub fn set_hit(&mut self, channel: Channel, hit: bool) {
        match channel {
            Channel::Front => self.front_hit = hit,
            Channel::Rear => self.rear_hit = hit,
        }
    }

    /// Blank both previews and hit indicators
    pub fn clear(&mut self) {
        *self = ChannelRouter::default();
    }
}
