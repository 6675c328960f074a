use super::error::CodecError;

pub const MAX_STRING_BYTES: usize = u16::MAX as usize;

const WORD_BITS: u32 = 32;
const WORD_BYTES: usize = 4;

/// Number of bits needed to hold any offset in `[0, span]`.
pub const fn bits_required(span: u64) -> u32 {
    u64::BITS - span.leading_zeros()
}

/// Bit-packed read/write cursor over a fixed-capacity byte region.
///
/// Bits are accumulated least-significant first and spilled to the byte region
/// as big-endian 32-bit words. After [`BitBuffer::flush`] the cursor is rewound
/// and the same buffer can be read back field by field.
#[derive(Debug, Clone)]
pub struct BitBuffer {
    bytes: Vec<u8>,
    position: usize,
    available: usize,
    bits: u64,
    bit_count: u32,
}

impl BitBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: vec![0u8; capacity - capacity % WORD_BYTES],
            position: 0,
            available: 0,
            bits: 0,
            bit_count: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    /// Bytes readable after a flush or load.
    pub fn len(&self) -> usize {
        self.available
    }

    pub fn is_empty(&self) -> bool {
        self.available == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.available]
    }

    /// Bits written since the last clear or flush.
    pub fn bits_written(&self) -> usize {
        self.position * 8 + self.bit_count as usize
    }

    pub fn has_remaining(&self) -> bool {
        self.position < self.available || self.bit_count > 0
    }

    pub fn clear(&mut self) {
        self.position = 0;
        self.available = 0;
        self.bits = 0;
        self.bit_count = 0;
    }

    /// Replaces the contents with a received datagram, ready for reading.
    pub fn load(&mut self, data: &[u8]) -> Result<(), CodecError> {
        if data.len() > self.capacity() {
            return Err(CodecError::BufferOverrun {
                needed: data.len(),
                capacity: self.capacity(),
            });
        }
        self.bytes[..data.len()].copy_from_slice(data);
        self.clear();
        self.available = data.len();
        Ok(())
    }

    /// Emits any partial word, records the written length and rewinds for reading.
    pub fn flush(&mut self) {
        if self.bit_count > 0 {
            self.emit_word();
        }
        self.available = self.position;
        self.position = 0;
        self.bits = 0;
        self.bit_count = 0;
    }

    pub fn put_bits(&mut self, value: u32, count: u32) -> Result<(), CodecError> {
        if count > WORD_BITS {
            return Err(CodecError::invalid_range(0, count));
        }
        if count == 0 {
            return Ok(());
        }
        if count < WORD_BITS && value >> count != 0 {
            return Err(CodecError::out_of_range(value, 0, (1u32 << count) - 1));
        }

        // Room for every word the pending bits will eventually occupy, flush included.
        let pending = self.bit_count + count;
        let needed = self.position + pending.div_ceil(WORD_BITS) as usize * WORD_BYTES;
        if needed > self.capacity() {
            return Err(CodecError::BufferOverrun {
                needed,
                capacity: self.capacity(),
            });
        }

        self.bits |= u64::from(value) << self.bit_count;
        self.bit_count = pending;
        if self.bit_count >= WORD_BITS {
            self.emit_word();
            self.bits >>= WORD_BITS;
            self.bit_count -= WORD_BITS;
        }
        Ok(())
    }

    pub fn get_bits(&mut self, count: u32) -> Result<u32, CodecError> {
        if count > WORD_BITS {
            return Err(CodecError::invalid_range(0, count));
        }
        if count == 0 {
            return Ok(0);
        }
        if self.bit_count < count {
            self.refill()?;
        }

        let mask = (1u64 << count) - 1;
        let value = (self.bits & mask) as u32;
        self.bits >>= count;
        self.bit_count -= count;
        Ok(value)
    }

    pub fn put_bit(&mut self, value: bool) -> Result<(), CodecError> {
        self.put_bits(u32::from(value), 1)
    }

    pub fn get_bit(&mut self) -> Result<bool, CodecError> {
        Ok(self.get_bits(1)? == 1)
    }

    pub fn put_range(&mut self, value: i64, min: i64, max: i64) -> Result<(), CodecError> {
        let bits = range_bits(min, max)?;
        if value < min || value > max {
            return Err(CodecError::out_of_range(value as f64, min as f64, max as f64));
        }
        self.put_bits((value - min) as u32, bits)
    }

    pub fn get_range(&mut self, min: i64, max: i64) -> Result<i64, CodecError> {
        let bits = range_bits(min, max)?;
        let value = min + i64::from(self.get_bits(bits)?);
        if value > max {
            return Err(CodecError::out_of_range(value as f64, min as f64, max as f64));
        }
        Ok(value)
    }

    pub fn put_int(&mut self, value: i32) -> Result<(), CodecError> {
        self.put_range(value.into(), i32::MIN.into(), i32::MAX.into())
    }

    pub fn get_int(&mut self) -> Result<i32, CodecError> {
        let value = self.get_range(i32::MIN.into(), i32::MAX.into())?;
        Ok(value as i32)
    }

    pub fn put_u32(&mut self, value: u32) -> Result<(), CodecError> {
        self.put_bits(value, WORD_BITS)
    }

    pub fn get_u32(&mut self) -> Result<u32, CodecError> {
        self.get_bits(WORD_BITS)
    }

    pub fn put_float(&mut self, value: f32) -> Result<(), CodecError> {
        self.put_bits(value.to_bits(), WORD_BITS)
    }

    pub fn get_float(&mut self) -> Result<f32, CodecError> {
        Ok(f32::from_bits(self.get_bits(WORD_BITS)?))
    }

    pub fn put_quantized_float(
        &mut self,
        value: f32,
        min: f32,
        max: f32,
        resolution: f32,
    ) -> Result<(), CodecError> {
        let steps = quantization_steps(min, max, resolution)?;
        if !(min..=max).contains(&value) {
            return Err(CodecError::out_of_range(value, min, max));
        }
        let bucket = (((value - min) / resolution) as u32).min(steps);
        self.put_bits(bucket, bits_required(steps.into()))
    }

    pub fn get_quantized_float(
        &mut self,
        min: f32,
        max: f32,
        resolution: f32,
    ) -> Result<f32, CodecError> {
        let steps = quantization_steps(min, max, resolution)?;
        let bucket = self.get_bits(bits_required(steps.into()))?;
        Ok(min + bucket as f32 * resolution)
    }

    /// Like [`BitBuffer::get_quantized_float`] but the top bucket decodes to exactly `max`.
    pub fn get_snapped_quantized_float(
        &mut self,
        min: f32,
        max: f32,
        resolution: f32,
    ) -> Result<f32, CodecError> {
        let steps = quantization_steps(min, max, resolution)?;
        let bucket = self.get_bits(bits_required(steps.into()))?;
        if bucket == steps {
            return Ok(max);
        }
        Ok(min + bucket as f32 * resolution)
    }

    pub fn put_string(&mut self, value: &str) -> Result<(), CodecError> {
        let bytes = value.as_bytes();
        if bytes.len() > MAX_STRING_BYTES {
            return Err(CodecError::Encoding(format!(
                "{} bytes exceeds the {} byte limit",
                bytes.len(),
                MAX_STRING_BYTES
            )));
        }
        self.put_range(bytes.len() as i64, 0, MAX_STRING_BYTES as i64)?;
        for &byte in bytes {
            self.put_bits(byte.into(), 8)?;
        }
        Ok(())
    }

    pub fn get_string(&mut self) -> Result<String, CodecError> {
        let len = self.get_range(0, MAX_STRING_BYTES as i64)? as usize;
        let mut bytes = Vec::with_capacity(len.min(self.available));
        for _ in 0..len {
            bytes.push(self.get_bits(8)? as u8);
        }
        String::from_utf8(bytes).map_err(|e| CodecError::Encoding(e.to_string()))
    }

    pub fn put_enum(&mut self, index: u32, count: u32) -> Result<(), CodecError> {
        let max = enum_max(count)?;
        self.put_range(index.into(), 0, max)
    }

    pub fn get_enum(&mut self, count: u32) -> Result<u32, CodecError> {
        let max = enum_max(count)?;
        Ok(self.get_range(0, max)? as u32)
    }

    fn emit_word(&mut self) {
        let word = (self.bits as u32).to_be_bytes();
        self.bytes[self.position..self.position + WORD_BYTES].copy_from_slice(&word);
        self.position += WORD_BYTES;
    }

    fn refill(&mut self) -> Result<(), CodecError> {
        if self.position + WORD_BYTES > self.available {
            return Err(CodecError::BufferUnderrun {
                available: self.available,
            });
        }
        let mut word = [0u8; WORD_BYTES];
        word.copy_from_slice(&self.bytes[self.position..self.position + WORD_BYTES]);
        self.position += WORD_BYTES;
        self.bits |= u64::from(u32::from_be_bytes(word)) << self.bit_count;
        self.bit_count += WORD_BITS;
        Ok(())
    }
}

fn range_bits(min: i64, max: i64) -> Result<u32, CodecError> {
    let span = max
        .checked_sub(min)
        .filter(|span| *span >= 0)
        .ok_or_else(|| CodecError::invalid_range(min as f64, max as f64))?;
    let bits = bits_required(span as u64);
    if bits > WORD_BITS {
        return Err(CodecError::invalid_range(min as f64, max as f64));
    }
    Ok(bits)
}

fn quantization_steps(min: f32, max: f32, resolution: f32) -> Result<u32, CodecError> {
    let valid = min < max && resolution > 0.0;
    if !valid {
        return Err(CodecError::invalid_range(min, max));
    }
    let steps = ((max - min) / resolution) as u64;
    u32::try_from(steps).map_err(|_| CodecError::invalid_range(min, max))
}

fn enum_max(count: u32) -> Result<i64, CodecError> {
    if count == 0 {
        return Err(CodecError::invalid_range(0, 0));
    }
    Ok(i64::from(count) - 1)
}
