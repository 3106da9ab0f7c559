use bitflags::bitflags;
use rkyv::{Archive, Deserialize, Serialize, rancor};

pub const MAX_PACKET_SIZE: usize = 1200;
pub const PROTOCOL_VERSION: u32 = 1;
pub const PROTOCOL_MAGIC: u32 = 0x514E_4554;

const SEQUENCE_WRAP_THRESHOLD: u32 = u32::MAX / 2;

fn normalize_angle(angle: f32) -> f32 {
    let two_pi = std::f32::consts::TAU;
    let mut normalized = angle % two_pi;
    if normalized > std::f32::consts::PI {
        normalized -= two_pi;
    } else if normalized < -std::f32::consts::PI {
        normalized += two_pi;
    }
    normalized
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(compare(PartialEq), derive(Debug))]
pub struct PacketHeader {
    pub magic: u32,
    pub version: u32,
    pub sequence: u32,
}

impl PacketHeader {
    pub fn new(sequence: u32) -> Self {
        Self {
            magic: PROTOCOL_MAGIC,
            version: PROTOCOL_VERSION,
            sequence,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.magic == PROTOCOL_MAGIC && self.version == PROTOCOL_VERSION
    }
}

#[inline]
pub fn sequence_greater_than(s1: u32, s2: u32) -> bool {
    ((s1 > s2) && (s1 - s2 <= SEQUENCE_WRAP_THRESHOLD))
        || ((s1 < s2) && (s2 - s1 > SEQUENCE_WRAP_THRESHOLD))
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct InputFlags: u16 {
        const SPRINT = 1 << 0;
        const JUMP = 1 << 1;
        const CROUCH = 1 << 2;
        const FIRE = 1 << 3;
        const AIM = 1 << 4;
    }
}

/// One frame of player input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct InputCommand {
    pub frame: u32,
    pub sequence: u32,
    pub move_direction: [i8; 3],
    pub view_angles: [i16; 2],
    pub flags: u16,
}

impl InputCommand {
    pub fn new(frame: u32, sequence: u32) -> Self {
        Self {
            frame,
            sequence,
            ..Default::default()
        }
    }

    pub fn decode_move_direction(&self) -> [f32; 3] {
        [
            self.move_direction[0] as f32 / 127.0,
            self.move_direction[1] as f32 / 127.0,
            self.move_direction[2] as f32 / 127.0,
        ]
    }

    pub fn encode_move_direction(&mut self, dir: [f32; 3]) {
        self.move_direction = [
            (dir[0].clamp(-1.0, 1.0) * 127.0) as i8,
            (dir[1].clamp(-1.0, 1.0) * 127.0) as i8,
            (dir[2].clamp(-1.0, 1.0) * 127.0) as i8,
        ];
    }

    pub fn decode_view_angles(&self) -> (f32, f32) {
        (
            self.view_angles[0] as f32 / 10000.0,
            self.view_angles[1] as f32 / 10000.0,
        )
    }

    pub fn encode_view_angles(&mut self, yaw: f32, pitch: f32) {
        let pitch = pitch.clamp(-std::f32::consts::FRAC_PI_2, std::f32::consts::FRAC_PI_2);
        self.view_angles = [
            (normalize_angle(yaw) * 10000.0) as i16,
            (pitch * 10000.0) as i16,
        ];
    }

    #[inline]
    pub fn flags(&self) -> InputFlags {
        InputFlags::from_bits_truncate(self.flags)
    }

    #[inline]
    pub fn set_flag(&mut self, flag: InputFlags, value: bool) {
        let mut flags = self.flags();
        flags.set(flag, value);
        self.flags = flags.bits();
    }
}

/// Serialized state of one object at the batch's server frame.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct ObjectSnapshot {
    pub object_id: u32,
    pub kind: u8,
    pub owner: Option<u32>,
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct SnapshotBatch {
    pub server_frame: u32,
    pub objects: Vec<ObjectSnapshot>,
}

impl SnapshotBatch {
    pub fn new(server_frame: u32) -> Self {
        Self {
            server_frame,
            objects: Vec::new(),
        }
    }
}

/// A shot as the client saw it: `view_frame` is the fractional server frame
/// its interpolated view was showing.
#[derive(Debug, Clone, Copy, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct HitRequest {
    pub shooter: u32,
    pub target: u32,
    pub origin: [f32; 3],
    pub direction: [f32; 3],
    pub max_distance: f32,
    pub view_frame: f64,
}

#[derive(Debug, Clone, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum PacketType {
    SnapshotBatch(SnapshotBatch),
    Input {
        object_id: u32,
        commands: Vec<InputCommand>,
    },
    HitRequest(HitRequest),
}

#[derive(Debug, Clone, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct Packet {
    pub header: PacketHeader,
    pub payload: PacketType,
}

#[derive(Debug, thiserror::Error)]
pub enum PacketError {
    #[error("serialization failed: {0}")]
    Serialize(rancor::Error),
    #[error("deserialization failed: {0}")]
    Deserialize(rancor::Error),
    #[error("invalid packet header (magic {magic:#010x}, version {version})")]
    InvalidHeader { magic: u32, version: u32 },
}

impl Packet {
    pub fn new(header: PacketHeader, payload: PacketType) -> Self {
        Self { header, payload }
    }

    pub fn serialize(&self) -> Result<Vec<u8>, PacketError> {
        let bytes = rkyv::to_bytes::<rancor::Error>(self)
            .map(|aligned| aligned.into_vec())
            .map_err(PacketError::Serialize)?;

        if bytes.len() > MAX_PACKET_SIZE {
            log::debug!(
                "packet {} is {} bytes, above the {} byte budget",
                self.header.sequence,
                bytes.len(),
                MAX_PACKET_SIZE
            );
        }
        Ok(bytes)
    }

    pub fn deserialize(data: &[u8]) -> Result<Self, PacketError> {
        let packet =
            rkyv::from_bytes::<Self, rancor::Error>(data).map_err(PacketError::Deserialize)?;
        if !packet.header.is_valid() {
            return Err(PacketError::InvalidHeader {
                magic: packet.header.magic,
                version: packet.header.version,
            });
        }
        Ok(packet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_comparison() {
        assert!(sequence_greater_than(2, 1));
        assert!(!sequence_greater_than(1, 2));
        assert!(sequence_greater_than(0, u32::MAX));
        assert!(!sequence_greater_than(u32::MAX, 0));
    }

    #[test]
    fn test_input_command_encoding() {
        let mut command = InputCommand::new(10, 1);
        command.encode_move_direction([1.0, 0.0, -0.5]);
        command.encode_view_angles(std::f32::consts::PI + 0.5, 0.25);
        command.set_flag(InputFlags::SPRINT, true);
        command.set_flag(InputFlags::FIRE, true);
        command.set_flag(InputFlags::SPRINT, false);

        let dir = command.decode_move_direction();
        assert!((dir[0] - 1.0).abs() < 0.01);
        assert!((dir[2] + 0.5).abs() < 0.01);

        let (yaw, pitch) = command.decode_view_angles();
        assert!((yaw - (0.5 - std::f32::consts::PI)).abs() < 0.001);
        assert!((pitch - 0.25).abs() < 0.001);

        assert_eq!(command.flags(), InputFlags::FIRE);
    }

    #[test]
    fn test_packet_serialization() {
        let mut batch = SnapshotBatch::new(120);
        batch.objects.push(ObjectSnapshot {
            object_id: 3,
            kind: 0,
            owner: Some(1),
            payload: vec![1, 2, 3, 4],
        });
        let packet = Packet::new(PacketHeader::new(7), PacketType::SnapshotBatch(batch.clone()));

        let serialized = packet.serialize().unwrap();
        let deserialized = Packet::deserialize(&serialized).unwrap();

        assert_eq!(packet.header, deserialized.header);
        match deserialized.payload {
            PacketType::SnapshotBatch(decoded) => assert_eq!(decoded, batch),
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_foreign_header_rejected() {
        let mut header = PacketHeader::new(1);
        header.magic = 0xDEAD_BEEF;
        let packet = Packet::new(
            header,
            PacketType::Input {
                object_id: 1,
                commands: Vec::new(),
            },
        );

        let serialized = packet.serialize().unwrap();
        assert!(matches!(
            Packet::deserialize(&serialized),
            Err(PacketError::InvalidHeader { magic: 0xDEAD_BEEF, .. })
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            Packet::deserialize(&[0xFF; 7]),
            Err(PacketError::Deserialize(_))
        ));
    }
}
