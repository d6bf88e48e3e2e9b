//! Bulk OUT packet decoding
//!
//! The host sends one command per packet, with no header, tag or checksum.
//! The packet's length selects the command. Decoding checks, in order:
//!
//! 1. exactly 4 bytes: [`ActuatorCommand`]
//! 2. exactly 6 bytes: [`ServoCommand`]
//! 3. first byte is `b'T'`: [`Command::Probe`]
//! 4. anything else: [`Command::Unrecognized`]
//!
//! Two command kinds sharing a length would be ambiguous, so keep the
//! lengths distinct when extending this.

/// Wire size of an [`ActuatorCommand`].
pub const ACTUATOR_COMMAND_LEN: usize = 4;
/// Wire size of a [`ServoCommand`].
pub const SERVO_COMMAND_LEN: usize = 6;
/// Leading byte that marks a probe.
pub const PROBE_MARKER: u8 = b'T';
/// Reply written to bulk IN for every probe.
pub const PROBE_REPLY: &[u8; 6] = b"hello\n";

/// Two actuator output values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ActuatorCommand {
    pub value0: u16,
    pub value1: u16,
}

impl ActuatorCommand {
    fn from_bytes(bytes: &[u8; ACTUATOR_COMMAND_LEN]) -> Self {
        Self {
            value0: u16::from_le_bytes([bytes[0], bytes[1]]),
            value1: u16::from_le_bytes([bytes[2], bytes[3]]),
        }
    }

    /// Values in channel order.
    pub fn values(&self) -> [u16; 2] {
        [self.value0, self.value1]
    }
}

/// Three servo positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ServoCommand {
    pub position0: u16,
    pub position1: u16,
    pub position2: u16,
}

impl ServoCommand {
    fn from_bytes(bytes: &[u8; SERVO_COMMAND_LEN]) -> Self {
        Self {
            position0: u16::from_le_bytes([bytes[0], bytes[1]]),
            position1: u16::from_le_bytes([bytes[2], bytes[3]]),
            position2: u16::from_le_bytes([bytes[4], bytes[5]]),
        }
    }

    /// Positions in channel order.
    pub fn positions(&self) -> [u16; 3] {
        [self.position0, self.position1, self.position2]
    }
}

/// A classified bulk OUT packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    Actuator(ActuatorCommand),
    Servo(ServoCommand),
    Probe,
    Unrecognized,
}

impl Command {
    /// Classify a packet.
    pub fn decode(packet: &[u8]) -> Self {
        if let Ok(bytes) = <&[u8; ACTUATOR_COMMAND_LEN]>::try_from(packet) {
            Command::Actuator(ActuatorCommand::from_bytes(bytes))
        } else if let Ok(bytes) = <&[u8; SERVO_COMMAND_LEN]>::try_from(packet) {
            Command::Servo(ServoCommand::from_bytes(bytes))
        } else if packet.first() == Some(&PROBE_MARKER) {
            Command::Probe
        } else {
            Command::Unrecognized
        }
    }

    /// Indicates if this command counts as link activity.
    pub fn is_activity(&self) -> bool {
        matches!(self, Command::Actuator(_) | Command::Servo(_))
    }
}

#[cfg(test)]
mod tests {
    use super::{ActuatorCommand, Command, ServoCommand};

    #[test]
    fn four_bytes_is_actuator() {
        let cmd = Command::decode(&[0x01, 0x00, 0x02, 0x00]);
        assert_eq!(
            cmd,
            Command::Actuator(ActuatorCommand {
                value0: 1,
                value1: 2
            })
        );
        assert!(cmd.is_activity());
    }

    #[test]
    fn actuator_fields_are_little_endian() {
        let cmd = Command::decode(&[0x34, 0x12, 0xFF, 0x0F]);
        let Command::Actuator(cmd) = cmd else {
            panic!("expected actuator command");
        };
        assert_eq!(cmd.values(), [0x1234, 0x0FFF]);
    }

    #[test]
    fn six_bytes_is_servo() {
        let cmd = Command::decode(&[0xDC, 0x05, 0xE8, 0x03, 0xD0, 0x07]);
        assert_eq!(
            cmd,
            Command::Servo(ServoCommand {
                position0: 1500,
                position1: 1000,
                position2: 2000,
            })
        );
        assert!(cmd.is_activity());
    }

    #[test]
    fn length_wins_over_probe_marker() {
        // A 4-byte packet starting with 'T' is still an actuator command.
        let cmd = Command::decode(b"Test");
        assert_eq!(
            cmd,
            Command::Actuator(ActuatorCommand {
                value0: u16::from_le_bytes([b'T', b'e']),
                value1: u16::from_le_bytes([b's', b't']),
            })
        );

        let cmd = Command::decode(b"Tested");
        assert!(matches!(cmd, Command::Servo(_)));
    }

    #[test]
    fn probe_any_other_length() {
        assert_eq!(Command::decode(b"T"), Command::Probe);
        assert_eq!(Command::decode(b"TE"), Command::Probe);
        assert_eq!(Command::decode(b"Tes"), Command::Probe);
        assert_eq!(Command::decode(b"Test\n"), Command::Probe);
        assert_eq!(Command::decode(b"Testing"), Command::Probe);
        assert_eq!(Command::decode(&[b'T'; 64]), Command::Probe);
        assert!(!Command::Probe.is_activity());
    }

    #[test]
    fn everything_else_is_unrecognized() {
        assert_eq!(Command::decode(&[]), Command::Unrecognized);
        assert_eq!(Command::decode(&[0x00]), Command::Unrecognized);
        assert_eq!(Command::decode(b"t"), Command::Unrecognized);
        assert_eq!(Command::decode(&[1, 2, 3]), Command::Unrecognized);
        assert_eq!(Command::decode(&[1, 2, 3, 4, 5]), Command::Unrecognized);
        assert_eq!(Command::decode(&[0; 64]), Command::Unrecognized);
        assert!(!Command::Unrecognized.is_activity());
    }
}
