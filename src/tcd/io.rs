//! Byte-level primitives shared by all database files
//!
//! All integers on disk are little-endian unsigned 32-bit. The FAT32
//! timestamp codec matches the packed date+time layout the firmware stores
//! in the mtime slot.

use chrono::{Datelike, Local, TimeZone, Timelike};
use std::io::{Read, Write};

/// Failure while pulling fixed-width data off a stream.
#[derive(Debug)]
pub enum ReadFailure {
    Io(std::io::Error),
    /// Stream ended before the requested byte count was available.
    Short { expected: usize, got: usize },
}

impl From<std::io::Error> for ReadFailure {
    fn from(e: std::io::Error) -> Self {
        ReadFailure::Io(e)
    }
}

/// Fill `buf` completely, reporting how many bytes were actually available
/// when the stream ends early.
pub fn read_exact_counted<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<(), ReadFailure> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(ReadFailure::Short {
                    expected: buf.len(),
                    got: filled,
                })
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ReadFailure::Io(e)),
        }
    }
    Ok(())
}

/// Read one little-endian u32.
pub fn read_u32<R: Read>(r: &mut R) -> Result<u32, ReadFailure> {
    let mut buf = [0u8; 4];
    read_exact_counted(r, &mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

/// Write one little-endian u32.
pub fn write_u32<W: Write>(w: &mut W, value: u32) -> std::io::Result<()> {
    w.write_all(&value.to_le_bytes())
}

/// CRC32 (IEEE) of the lowercased UTF-8 bytes of `s`, seeded with
/// 0xFFFFFFFF. The firmware stores this checksum in string slots of
/// DELETED records; the build pipeline itself never calls it.
pub fn crc32_lowercase(s: &str) -> u32 {
    let mut hasher = crc32fast::Hasher::new_with_initial(0xFFFF_FFFF);
    hasher.update(s.to_lowercase().as_bytes());
    hasher.finalize()
}

/// Pack a Unix timestamp into the FAT32 date+time word pair used by the
/// mtime slot. Local-time components, 2-second resolution.
pub fn fat_pack(unix_seconds: i64) -> u32 {
    let dt = match Local.timestamp_opt(unix_seconds, 0).single() {
        Some(dt) => dt,
        None => return 0,
    };

    let year = (dt.year() - 1980).max(0) as u32;
    let date_word = (year << 9) | (dt.month() << 5) | dt.day();
    let time_word = (dt.hour() << 11) | (dt.minute() << 5) | (dt.second() / 2);

    (date_word << 16) | time_word
}

/// Inverse of [`fat_pack`], for diagnostic tooling. Returns `None` when the
/// packed fields do not name a real local time.
pub fn fat_unpack(fat: u32) -> Option<i64> {
    let date_word = fat >> 16;
    let time_word = fat & 0xFFFF;

    let year = ((date_word >> 9) & 0x7F) as i32 + 1980;
    let month = (date_word >> 5) & 0x0F;
    let day = date_word & 0x1F;
    let hour = (time_word >> 11) & 0x1F;
    let minute = (time_word >> 5) & 0x3F;
    let second = (time_word & 0x1F) * 2;

    Local
        .with_ymd_and_hms(year, month, day, hour, minute, second)
        .single()
        .map(|dt| dt.timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn u32_round_trip() {
        let mut buf = Vec::new();
        write_u32(&mut buf, 0x5443_4810).unwrap();
        assert_eq!(buf, [0x10, 0x48, 0x43, 0x54]);
        assert_eq!(read_u32(&mut Cursor::new(&buf)).unwrap(), 0x5443_4810);
    }

    #[test]
    fn short_read_reports_counts() {
        let mut cursor = Cursor::new(vec![0u8; 3]);
        match read_u32(&mut cursor) {
            Err(ReadFailure::Short { expected, got }) => {
                assert_eq!(expected, 4);
                assert_eq!(got, 3);
            }
            other => panic!("expected short read, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn fat_pack_layout() {
        // 2001-02-03 04:05:06 local time
        let ts = Local
            .with_ymd_and_hms(2001, 2, 3, 4, 5, 6)
            .single()
            .unwrap()
            .timestamp();
        let fat = fat_pack(ts);
        assert_eq!(fat >> 25, 21); // 2001 - 1980
        assert_eq!((fat >> 21) & 0x0F, 2);
        assert_eq!((fat >> 16) & 0x1F, 3);
        assert_eq!((fat >> 11) & 0x1F, 4);
        assert_eq!((fat >> 5) & 0x3F, 5);
        assert_eq!(fat & 0x1F, 3); // seconds / 2
    }

    #[test]
    fn fat_round_trip_within_resolution() {
        let ts = Local
            .with_ymd_and_hms(2019, 11, 30, 23, 59, 58)
            .single()
            .unwrap()
            .timestamp();
        let back = fat_unpack(fat_pack(ts)).unwrap();
        assert!((back - ts).abs() < 2);
    }

    #[test]
    fn crc32_is_case_insensitive() {
        assert_eq!(crc32_lowercase("Led Zeppelin"), crc32_lowercase("led zeppelin"));
    }
}
