use crate::rdb::RdbError;

/// How the bytes following a length prefix are to be read.
#[derive(Debug, PartialEq)]
enum ValueEncoding {
    Length(usize),
    Int8,
    Int16,
    Int32,
    LzfCompressedString,
}

/// Borrows `len` bytes at `cursor`, or reports that more input is needed.
pub fn take(bytes: &[u8], cursor: usize, len: usize) -> Result<&[u8], RdbError> {
    let end = cursor.checked_add(len).ok_or(RdbError::Incomplete)?;
    bytes.get(cursor..end).ok_or(RdbError::Incomplete)
}

pub fn take_array<const N: usize>(bytes: &[u8], cursor: usize) -> Result<[u8; N], RdbError> {
    let slice = take(bytes, cursor, N)?;
    let mut array = [0; N];
    array.copy_from_slice(slice);

    Ok(array)
}

fn parse_length_encoding(bytes: &[u8], cursor: usize) -> Result<(ValueEncoding, usize), RdbError> {
    let [first] = take_array::<1>(bytes, cursor)?;

    // The two most significant bits select the format.
    match first >> 6 {
        0b00 => Ok((ValueEncoding::Length((first & 0b0011_1111) as usize), 1)),
        0b01 => {
            let [second] = take_array::<1>(bytes, cursor + 1)?;
            let length = (((first & 0b0011_1111) as usize) << 8) | second as usize;

            Ok((ValueEncoding::Length(length), 2))
        }
        0b10 => match first {
            0x80 => {
                let length = u32::from_be_bytes(take_array(bytes, cursor + 1)?);
                Ok((ValueEncoding::Length(length as usize), 5))
            }
            0x81 => {
                let length = u64::from_be_bytes(take_array(bytes, cursor + 1)?);
                let length = usize::try_from(length).map_err(|_| RdbError::InvalidLengthEncoding(first))?;
                Ok((ValueEncoding::Length(length), 9))
            }
            _ => Err(RdbError::InvalidLengthEncoding(first)),
        },
        _ => match first & 0b0011_1111 {
            0 => Ok((ValueEncoding::Int8, 1)),
            1 => Ok((ValueEncoding::Int16, 1)),
            2 => Ok((ValueEncoding::Int32, 1)),
            3 => Ok((ValueEncoding::LzfCompressedString, 1)),
            _ => Err(RdbError::InvalidLengthEncoding(first)),
        },
    }
}

/// Reads a plain length (database numbers, hash table sizes).
pub fn parse_length(bytes: &[u8], cursor: usize) -> Result<(usize, usize), RdbError> {
    match parse_length_encoding(bytes, cursor)? {
        (ValueEncoding::Length(length), read) => Ok((length, read)),
        _ => Err(RdbError::UnsupportedEncoding),
    }
}

/// Reads a string, including integers stored in their compact
/// little-endian form, which are rendered in decimal.
pub fn parse_string(bytes: &[u8], cursor: usize) -> Result<(String, usize), RdbError> {
    let (encoding, prefix) = parse_length_encoding(bytes, cursor)?;
    let start = cursor + prefix;

    let (value, body) = match encoding {
        ValueEncoding::Length(length) => {
            let raw = take(bytes, start, length)?;
            let value = String::from_utf8(raw.to_vec()).map_err(|_| RdbError::InvalidUtf8)?;
            (value, length)
        }
        ValueEncoding::Int8 => (i8::from_le_bytes(take_array(bytes, start)?).to_string(), 1),
        ValueEncoding::Int16 => (i16::from_le_bytes(take_array(bytes, start)?).to_string(), 2),
        ValueEncoding::Int32 => (i32::from_le_bytes(take_array(bytes, start)?).to_string(), 4),
        ValueEncoding::LzfCompressedString => return Err(RdbError::UnsupportedEncoding),
    };

    Ok((value, prefix + body))
}
