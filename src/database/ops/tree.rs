use anyhow::{Context, Result, anyhow};
use redb::backends::InMemoryBackend;
use redb::{Database, ReadableTable};
use std::path::Path;

use crate::database::ops::cursor::MediaPage;
use crate::database::schema::media::{MEDIA_BY_MODEL_TYPE_TABLE, MEDIA_TABLE, MediaRecord};

pub struct Tree {
    pub in_disk: Database,
}

impl Tree {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .context(format!("failed to create directory tree {:?}", parent))?;
        }
        let in_disk = Database::create(path)
            .context(format!("failed to open media database at {:?}", path))?;
        Self::initialize(in_disk)
    }

    pub fn in_memory() -> Result<Self> {
        let in_disk = redb::Builder::new().create_with_backend(InMemoryBackend::new())?;
        Self::initialize(in_disk)
    }

    fn initialize(in_disk: Database) -> Result<Self> {
        let txn = in_disk.begin_write()?;
        {
            let _ = txn.open_table(MEDIA_TABLE)?;
            let _ = txn.open_table(MEDIA_BY_MODEL_TYPE_TABLE)?;
        }
        txn.commit()?;
        Ok(Self { in_disk })
    }

    pub fn begin_read(&self) -> Result<redb::ReadTransaction> {
        Ok(self.in_disk.begin_read()?)
    }

    pub fn begin_write(&self) -> Result<redb::WriteTransaction> {
        Ok(self.in_disk.begin_write()?)
    }

    /// Insert or replace a record, keeping the model type index in step.
    pub fn insert_media(&self, media: &MediaRecord) -> Result<()> {
        let txn = self.begin_write()?;
        {
            let mut table = txn.open_table(MEDIA_TABLE)?;
            let mut index = txn.open_table(MEDIA_BY_MODEL_TYPE_TABLE)?;

            let encoded = bitcode::encode(media);
            let previous: Option<Vec<u8>> = table
                .insert(media.id, encoded.as_slice())?
                .map(|guard| guard.value().to_vec());

            if let Some(bytes) = previous {
                let previous: MediaRecord = bitcode::decode(&bytes)?;
                index.remove((previous.model_type.as_str(), previous.id))?;
            }
            index.insert((media.model_type.as_str(), media.id), ())?;
        }
        txn.commit()?;
        Ok(())
    }

    pub fn load_media(&self, id: u64) -> Result<Option<MediaRecord>> {
        let txn = self.begin_read()?;
        let table = txn.open_table(MEDIA_TABLE)?;
        match table.get(id)? {
            Some(bytes) => Ok(Some(bitcode::decode(bytes.value())?)),
            None => Ok(None),
        }
    }

    /// Add conversion names to the generated set of one record.
    pub fn mark_generated<I>(&self, id: u64, names: I) -> Result<()>
    where
        I: IntoIterator<Item = String>,
    {
        let txn = self.begin_write()?;
        {
            let mut table = txn.open_table(MEDIA_TABLE)?;
            let bytes = table
                .get(id)?
                .map(|guard| guard.value().to_vec())
                .ok_or_else(|| anyhow!("No media found for id: {}", id))?;
            let mut media: MediaRecord = bitcode::decode(&bytes)?;
            media.generated_conversions.extend(names);
            let encoded = bitcode::encode(&media);
            table.insert(id, encoded.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Records with `id >= from`, ascending, at most `limit` of them.
    pub fn read_media_page(&self, from: u64, limit: usize) -> Result<MediaPage> {
        let txn = self.begin_read()?;
        let table = txn.open_table(MEDIA_TABLE)?;

        let mut records: Vec<MediaRecord> = Vec::with_capacity(limit);
        for entry in table.range(from..)?.take(limit) {
            let (_, value) = entry?;
            records.push(bitcode::decode(value.value())?);
        }
        Ok(MediaPage::from_range(records, limit))
    }

    /// Same as [`Tree::read_media_page`], narrowed to one model type through the index.
    pub fn read_media_page_by_model_type(
        &self,
        model_type: &str,
        from: u64,
        limit: usize,
    ) -> Result<MediaPage> {
        let txn = self.begin_read()?;
        let index = txn.open_table(MEDIA_BY_MODEL_TYPE_TABLE)?;
        let table = txn.open_table(MEDIA_TABLE)?;

        let mut records: Vec<MediaRecord> = Vec::with_capacity(limit);
        for entry in index
            .range((model_type, from)..=(model_type, u64::MAX))?
            .take(limit)
        {
            let (key, _) = entry?;
            let (_, id) = key.value();
            let bytes = table
                .get(id)?
                .ok_or_else(|| anyhow!("Index points at missing media: {}", id))?;
            records.push(bitcode::decode(bytes.value())?);
        }
        Ok(MediaPage::from_range(records, limit))
    }

    /// Known records among `ids`; unknown ids are skipped.
    pub fn read_media_by_ids(&self, ids: &[u64]) -> Result<Vec<MediaRecord>> {
        let txn = self.begin_read()?;
        let table = txn.open_table(MEDIA_TABLE)?;

        let mut records: Vec<MediaRecord> = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(bytes) = table.get(*id)? {
                records.push(bitcode::decode(bytes.value())?);
            }
        }
        Ok(records)
    }

    pub fn count_media_from(&self, from: u64) -> Result<u64> {
        let txn = self.begin_read()?;
        let table = txn.open_table(MEDIA_TABLE)?;
        let mut count = 0;
        for entry in table.range(from..)? {
            entry?;
            count += 1;
        }
        Ok(count)
    }

    pub fn count_media_by_model_type(&self, model_type: &str, from: u64) -> Result<u64> {
        let txn = self.begin_read()?;
        let index = txn.open_table(MEDIA_BY_MODEL_TYPE_TABLE)?;
        let mut count = 0;
        for entry in index.range((model_type, from)..=(model_type, u64::MAX))? {
            entry?;
            count += 1;
        }
        Ok(count)
    }

    pub fn count_media_by_ids(&self, ids: &[u64]) -> Result<u64> {
        let txn = self.begin_read()?;
        let table = txn.open_table(MEDIA_TABLE)?;
        let mut count = 0;
        for id in ids {
            if table.get(*id)?.is_some() {
                count += 1;
            }
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reinserting_with_a_new_model_type_moves_the_index_entry() {
        let tree = Tree::in_memory().unwrap();
        tree.insert_media(&MediaRecord::new(1, "Post", "10", "default", "a.jpg"))
            .unwrap();
        tree.insert_media(&MediaRecord::new(1, "User", "10", "default", "a.jpg"))
            .unwrap();

        assert_eq!(tree.count_media_by_model_type("Post", 0).unwrap(), 0);
        assert_eq!(tree.count_media_by_model_type("User", 0).unwrap(), 1);
    }

    #[test]
    fn mark_generated_extends_the_stored_set() {
        let tree = Tree::in_memory().unwrap();
        tree.insert_media(&MediaRecord::new(3, "Post", "1", "default", "a.jpg"))
            .unwrap();

        tree.mark_generated(3, ["thumb".to_string()]).unwrap();
        tree.mark_generated(3, ["preview".to_string()]).unwrap();

        let media = tree.load_media(3).unwrap().unwrap();
        assert!(media.has_generated_conversion("thumb"));
        assert!(media.has_generated_conversion("preview"));
    }

    #[test]
    fn mark_generated_on_unknown_media_fails() {
        let tree = Tree::in_memory().unwrap();
        assert!(tree.mark_generated(42, ["thumb".to_string()]).is_err());
    }
}
