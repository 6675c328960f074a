//! Field helpers shared by every message: ids and counts travel as 32-bit ints.

use crate::codec::{BitBuffer, CodecError};

const NONE_MARK: i32 = -1;

/// Width of every id, mark and count field.
pub(crate) const FIELD_BITS: usize = 32;

pub(crate) fn put_id(buf: &mut BitBuffer, id: u32) -> Result<(), CodecError> {
    let value = i32::try_from(id).map_err(|_| CodecError::out_of_range(id, 0, i32::MAX as u32))?;
    buf.put_int(value)
}

pub(crate) fn get_id(buf: &mut BitBuffer) -> Result<u32, CodecError> {
    let value = buf.get_int()?;
    u32::try_from(value).map_err(|_| CodecError::out_of_range(value, 0, i32::MAX))
}

pub(crate) fn put_mark(buf: &mut BitBuffer, mark: Option<u32>) -> Result<(), CodecError> {
    match mark {
        Some(id) => put_id(buf, id),
        None => buf.put_int(NONE_MARK),
    }
}

pub(crate) fn get_mark(buf: &mut BitBuffer) -> Result<Option<u32>, CodecError> {
    let value = buf.get_int()?;
    if value == NONE_MARK {
        return Ok(None);
    }
    u32::try_from(value)
        .map(Some)
        .map_err(|_| CodecError::out_of_range(value, NONE_MARK, i32::MAX))
}

pub(crate) fn put_count(buf: &mut BitBuffer, count: usize) -> Result<(), CodecError> {
    let value = i32::try_from(count)
        .map_err(|_| CodecError::out_of_range(count as f64, 0.0, f64::from(i32::MAX)))?;
    buf.put_int(value)
}

pub(crate) fn get_count(buf: &mut BitBuffer) -> Result<usize, CodecError> {
    Ok(get_id(buf)? as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marks_use_minus_one_for_none() {
        let mut buf = BitBuffer::with_capacity(16);
        put_mark(&mut buf, None).unwrap();
        put_mark(&mut buf, Some(7)).unwrap();
        buf.flush();
        assert_eq!(buf.get_int().unwrap(), -1);
        assert_eq!(get_mark(&mut buf).unwrap(), Some(7));
    }

    #[test]
    fn negative_ids_are_rejected() {
        let mut buf = BitBuffer::with_capacity(16);
        buf.put_int(-5).unwrap();
        buf.put_int(-2).unwrap();
        buf.flush();
        assert!(get_id(&mut buf).is_err());
        assert!(get_mark(&mut buf).is_err());

        assert!(put_id(&mut BitBuffer::with_capacity(16), u32::MAX).is_err());
    }
}
