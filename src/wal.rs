use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::model::Change;

/// Entries larger than this are treated as a corrupt length prefix.
const MAX_ENTRY_BYTES: usize = 16 * 1024 * 1024;

/// Encode a single change as `[len][bincode][crc32]`.
fn encode_change(writer: &mut impl Write, change: &Change) -> io::Result<()> {
    let payload =
        bincode::serialize(change).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writer.write_all(&(payload.len() as u32).to_le_bytes())?;
    writer.write_all(&payload)?;
    writer.write_all(&crc32fast::hash(&payload).to_le_bytes())?;
    Ok(())
}

/// Fill `buf` completely. `Ok(false)` on a clean or torn end of file.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<bool> {
    match reader.read_exact(buf) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    }
}

/// Read the next intact change. `None` at end of file or at the first
/// torn/corrupt entry; nothing after it is trusted.
fn decode_next(reader: &mut impl Read) -> io::Result<Option<Change>> {
    let mut len_buf = [0u8; 4];
    if !read_full(reader, &mut len_buf)? {
        return Ok(None);
    }
    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_ENTRY_BYTES {
        return Ok(None);
    }

    let mut payload = vec![0u8; len];
    if !read_full(reader, &mut payload)? {
        return Ok(None);
    }
    let mut crc_buf = [0u8; 4];
    if !read_full(reader, &mut crc_buf)? {
        return Ok(None);
    }
    if u32::from_le_bytes(crc_buf) != crc32fast::hash(&payload) {
        return Ok(None);
    }
    Ok(bincode::deserialize::<Change>(&payload).ok())
}

/// Append-only change log backing the store.
///
/// Every mutation is appended before it is applied in memory, and the whole
/// file is replayed on open. A torn tail left by a crash is dropped on replay.
pub struct Wal {
    writer: BufWriter<File>,
    path: PathBuf,
    appends_since_compact: u64,
}

impl Wal {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            path: path.to_path_buf(),
            appends_since_compact: 0,
        })
    }

    #[cfg(test)]
    pub fn append(&mut self, change: &Change) -> io::Result<()> {
        self.append_buffered(change)?;
        self.flush_sync()
    }

    /// Buffer one change. Durable only after `flush_sync`.
    pub fn append_buffered(&mut self, change: &Change) -> io::Result<()> {
        encode_change(&mut self.writer, change)?;
        self.appends_since_compact += 1;
        Ok(())
    }

    pub fn flush_sync(&mut self) -> io::Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn appends_since_compact(&self) -> u64 {
        self.appends_since_compact
    }

    fn compact_path(path: &Path) -> PathBuf {
        path.with_extension("wal.tmp")
    }

    /// Write a snapshot of `changes` next to the log and fsync it.
    pub fn write_compact_file(path: &Path, changes: &[Change]) -> io::Result<()> {
        let mut writer = BufWriter::new(File::create(Self::compact_path(path))?);
        for change in changes {
            encode_change(&mut writer, change)?;
        }
        writer.flush()?;
        writer.get_ref().sync_all()
    }

    /// Rename the snapshot over the log and reopen it for appends.
    pub fn swap_compact_file(&mut self) -> io::Result<()> {
        fs::rename(Self::compact_path(&self.path), &self.path)?;
        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        self.writer = BufWriter::new(file);
        self.appends_since_compact = 0;
        Ok(())
    }

    #[cfg(test)]
    pub fn compact(&mut self, changes: &[Change]) -> io::Result<()> {
        Self::write_compact_file(&self.path, changes)?;
        self.swap_compact_file()
    }

    /// All intact changes on disk, oldest first. A missing file is an empty log.
    pub fn replay(path: &Path) -> io::Result<Vec<Change>> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        let mut reader = BufReader::new(file);
        let mut changes = Vec::new();
        while let Some(change) = decode_next(&mut reader)? {
            changes.push(change);
        }
        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CalendarEvent, DaySpan};
    use chrono::NaiveDate;
    use ulid::Ulid;

    fn tmp_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("daygrid_test_wal");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let _ = fs::remove_file(&path);
        path
    }

    fn created(resource_id: Ulid, day: u32) -> Change {
        Change::EventCreated {
            event: CalendarEvent {
                id: Ulid::new(),
                resource_id,
                title: format!("Visit {day}"),
                span: DaySpan::single(NaiveDate::from_ymd_opt(2024, 5, day).unwrap()),
                start_time: None,
                end_time: None,
                color: Some("#3B82F6".into()),
                top: Some(4.0),
            },
        }
    }

    #[test]
    fn append_and_replay() {
        let path = tmp_path("append_and_replay.wal");
        let rid = Ulid::new();
        let changes = vec![
            Change::ResourceCreated { id: rid, name: "Resource A".into() },
            created(rid, 3),
        ];
        {
            let mut wal = Wal::open(&path).unwrap();
            for c in &changes {
                wal.append(c).unwrap();
            }
            assert_eq!(wal.appends_since_compact(), 2);
        }
        assert_eq!(Wal::replay(&path).unwrap(), changes);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn replay_missing_file_is_empty() {
        let path = tmp_path("missing.wal");
        assert!(Wal::replay(&path).unwrap().is_empty());
    }

    #[test]
    fn torn_tail_is_dropped() {
        let path = tmp_path("torn.wal");
        let first = Change::ResourceCreated { id: Ulid::new(), name: "Dock".into() };
        {
            let mut wal = Wal::open(&path).unwrap();
            wal.append(&first).unwrap();
        }
        {
            let mut f = OpenOptions::new().append(true).open(&path).unwrap();
            f.write_all(&[9u8, 0, 0, 0, 1, 2]).unwrap();
        }
        assert_eq!(Wal::replay(&path).unwrap(), vec![first]);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn bad_checksum_stops_replay() {
        let path = tmp_path("bad_crc.wal");
        let change = Change::ResourceDeleted { id: Ulid::new() };
        {
            let payload = bincode::serialize(&change).unwrap();
            let mut f = File::create(&path).unwrap();
            f.write_all(&(payload.len() as u32).to_le_bytes()).unwrap();
            f.write_all(&payload).unwrap();
            f.write_all(&0xDEAD_BEEFu32.to_le_bytes()).unwrap();
        }
        assert!(Wal::replay(&path).unwrap().is_empty());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn oversized_length_prefix_stops_replay() {
        let path = tmp_path("oversized.wal");
        {
            let mut f = File::create(&path).unwrap();
            f.write_all(&u32::MAX.to_le_bytes()).unwrap();
        }
        assert!(Wal::replay(&path).unwrap().is_empty());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn compact_shrinks_and_accepts_appends() {
        let path = tmp_path("compact.wal");
        let rid = Ulid::new();
        let resource = Change::ResourceCreated { id: rid, name: "Resource B".into() };
        {
            let mut wal = Wal::open(&path).unwrap();
            wal.append(&resource).unwrap();
            for day in 1..=20 {
                let change = created(rid, day);
                let Change::EventCreated { event } = &change else { unreachable!() };
                let id = event.id;
                wal.append(&change).unwrap();
                wal.append(&Change::EventDeleted { id, resource_id: rid }).unwrap();
            }
        }
        let before = fs::metadata(&path).unwrap().len();

        let survivor = created(rid, 21);
        {
            let mut wal = Wal::open(&path).unwrap();
            wal.compact(std::slice::from_ref(&resource)).unwrap();
            assert_eq!(wal.appends_since_compact(), 0);
            wal.append(&survivor).unwrap();
        }

        let after = fs::metadata(&path).unwrap().len();
        assert!(after < before, "compacted log should shrink: {after} < {before}");
        assert_eq!(Wal::replay(&path).unwrap(), vec![resource, survivor]);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn buffered_appends_survive_flush() {
        let path = tmp_path("buffered.wal");
        let changes: Vec<Change> = (0..5)
            .map(|i| Change::ResourceCreated { id: Ulid::new(), name: format!("R{i}") })
            .collect();
        {
            let mut wal = Wal::open(&path).unwrap();
            for c in &changes {
                wal.append_buffered(c).unwrap();
            }
            wal.flush_sync().unwrap();
        }
        assert_eq!(Wal::replay(&path).unwrap(), changes);
        let _ = fs::remove_file(&path);
    }
}
