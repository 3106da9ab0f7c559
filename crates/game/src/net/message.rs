use bytes::{Buf, BufMut, Bytes, BytesMut};
use glam::{Quat, Vec3};

use crate::error::MessageError;

const MIN_QUAT_LENGTH_SQUARED: f32 = 1e-6;

/// Typed little-endian writer for snapshot payloads.
#[derive(Debug, Default)]
pub struct MessageWriter {
    buf: BytesMut,
}

impl MessageWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.put_u8(value as u8);
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buf.put_u32_le(value);
    }

    pub fn write_f32(&mut self, value: f32) {
        self.buf.put_f32_le(value);
    }

    pub fn write_f64(&mut self, value: f64) {
        self.buf.put_f64_le(value);
    }

    pub fn write_vec3(&mut self, value: Vec3) {
        self.write_f32(value.x);
        self.write_f32(value.y);
        self.write_f32(value.z);
    }

    pub fn write_quat(&mut self, value: Quat) {
        self.write_f32(value.x);
        self.write_f32(value.y);
        self.write_f32(value.z);
        self.write_f32(value.w);
    }

    pub fn write_enum<E: Into<u8>>(&mut self, value: E) {
        self.buf.put_u8(value.into());
    }

    /// Writes a length-prefixed nested message.
    pub fn write_message(&mut self, write: impl FnOnce(&mut MessageWriter)) {
        let mut nested = MessageWriter::new();
        write(&mut nested);
        self.buf.put_u32_le(nested.buf.len() as u32);
        self.buf.put_slice(&nested.buf);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }
}

#[derive(Debug, Clone)]
pub struct MessageReader {
    buf: Bytes,
}

impl MessageReader {
    pub fn new(buf: impl Into<Bytes>) -> Self {
        Self { buf: buf.into() }
    }

    pub fn from_slice(data: &[u8]) -> Self {
        Self {
            buf: Bytes::copy_from_slice(data),
        }
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn ensure(&self, needed: usize) -> Result<(), MessageError> {
        let remaining = self.buf.remaining();
        if remaining < needed {
            return Err(MessageError::UnexpectedEnd { needed, remaining });
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8, MessageError> {
        self.ensure(1)?;
        Ok(self.buf.get_u8())
    }

    pub fn read_bool(&mut self) -> Result<bool, MessageError> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u32(&mut self) -> Result<u32, MessageError> {
        self.ensure(4)?;
        Ok(self.buf.get_u32_le())
    }

    pub fn read_f32(&mut self) -> Result<f32, MessageError> {
        self.ensure(4)?;
        Ok(self.buf.get_f32_le())
    }

    pub fn read_f64(&mut self) -> Result<f64, MessageError> {
        self.ensure(8)?;
        Ok(self.buf.get_f64_le())
    }

    pub fn read_vec3(&mut self) -> Result<Vec3, MessageError> {
        self.ensure(12)?;
        Ok(Vec3::new(
            self.buf.get_f32_le(),
            self.buf.get_f32_le(),
            self.buf.get_f32_le(),
        ))
    }

    pub fn read_quat(&mut self) -> Result<Quat, MessageError> {
        self.ensure(16)?;
        let x = self.buf.get_f32_le();
        let y = self.buf.get_f32_le();
        let z = self.buf.get_f32_le();
        let w = self.buf.get_f32_le();

        let quat = Quat::from_xyzw(x, y, z, w);
        let length_squared = quat.length_squared();
        if !length_squared.is_finite() || length_squared < MIN_QUAT_LENGTH_SQUARED {
            return Err(MessageError::InvalidRotation);
        }
        Ok(quat.normalize())
    }

    pub fn read_enum<E: TryFrom<u8>>(&mut self, name: &'static str) -> Result<E, MessageError> {
        let value = self.read_u8()?;
        E::try_from(value).map_err(|_| MessageError::InvalidEnum { name, value })
    }

    /// Splits off a length-prefixed nested message.
    pub fn read_message(&mut self) -> Result<MessageReader, MessageError> {
        let len = self.read_u32()? as usize;
        self.ensure(len)?;
        Ok(MessageReader {
            buf: self.buf.split_to(len),
        })
    }
}
