use crate::codec::{BitBuffer, CodecError};
use crate::net::wire;

/// Per-sender monotonically increasing identifier, starting at zero.
pub type SequenceId = u32;

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Buttons: u8 {
        const FORWARD = 1 << 0;
        const BACKWARD = 1 << 1;
        const LEFT = 1 << 2;
        const RIGHT = 1 << 3;
        const SHOOT = 1 << 4;
    }
}

impl Buttons {
    pub const WIRE_ORDER: [Buttons; 5] = [
        Buttons::FORWARD,
        Buttons::BACKWARD,
        Buttons::LEFT,
        Buttons::RIGHT,
        Buttons::SHOOT,
    ];

    pub fn is_moving(self) -> bool {
        self.intersects(Self::FORWARD | Self::BACKWARD | Self::LEFT | Self::RIGHT)
    }

    pub fn encode(self, buf: &mut BitBuffer) -> Result<(), CodecError> {
        for button in Self::WIRE_ORDER {
            buf.put_bit(self.contains(button))?;
        }
        Ok(())
    }

    pub fn decode(buf: &mut BitBuffer) -> Result<Self, CodecError> {
        let mut buttons = Self::empty();
        for button in Self::WIRE_ORDER {
            buttons.set(button, buf.get_bit()?);
        }
        Ok(buttons)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocomotionCommand {
    pub id: SequenceId,
    pub buttons: Buttons,
}

impl LocomotionCommand {
    pub const WIRE_BITS: usize = wire::FIELD_BITS + Buttons::WIRE_ORDER.len();

    pub fn new(id: SequenceId, buttons: Buttons) -> Self {
        Self { id, buttons }
    }

    pub fn encode(&self, buf: &mut BitBuffer) -> Result<(), CodecError> {
        wire::put_id(buf, self.id)?;
        self.buttons.encode(buf)
    }

    pub fn decode(buf: &mut BitBuffer) -> Result<Self, CodecError> {
        let id = wire::get_id(buf)?;
        let buttons = Buttons::decode(buf)?;
        Ok(Self { id, buttons })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_is_id_plus_five_bits() {
        let mut buf = BitBuffer::with_capacity(64);
        let command = LocomotionCommand::new(9, Buttons::FORWARD | Buttons::SHOOT);
        command.encode(&mut buf).unwrap();
        assert_eq!(buf.bits_written(), 37);

        buf.flush();
        assert_eq!(LocomotionCommand::decode(&mut buf).unwrap(), command);
    }

    #[test]
    fn moving_ignores_shoot() {
        assert!(!Buttons::SHOOT.is_moving());
        assert!(!Buttons::empty().is_moving());
        assert!((Buttons::LEFT | Buttons::SHOOT).is_moving());
    }
}
