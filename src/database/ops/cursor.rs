use anyhow::Result;
use std::collections::VecDeque;

use crate::database::schema::media::MediaRecord;

/// One page of records plus where the next page starts, if anywhere.
#[derive(Debug, Default)]
pub struct MediaPage {
    pub records: Vec<MediaRecord>,
    pub next_from: Option<u64>,
}

impl MediaPage {
    /// A page read from an ascending id range: a short page ends the range.
    pub fn from_range(records: Vec<MediaRecord>, limit: usize) -> Self {
        let next_from = if records.len() < limit {
            None
        } else {
            records.last().and_then(|media| media.id.checked_add(1))
        };
        Self { records, next_from }
    }
}

type PageFetcher<'a> = Box<dyn FnMut(u64, usize) -> Result<MediaPage> + 'a>;

/// Lazy, ascending stream of media records.
///
/// Each page is read in its own short transaction, so the cursor can be
/// held across long-running generation without pinning the database, and
/// a fresh cursor can resume from any id.
pub struct MediaCursor<'a> {
    fetch_page: PageFetcher<'a>,
    next_from: Option<u64>,
    page_size: usize,
    buffer: VecDeque<MediaRecord>,
}

impl<'a> MediaCursor<'a> {
    pub fn new<F>(from: u64, page_size: usize, fetch_page: F) -> Self
    where
        F: FnMut(u64, usize) -> Result<MediaPage> + 'a,
    {
        Self {
            fetch_page: Box::new(fetch_page),
            next_from: Some(from),
            page_size: page_size.max(1),
            buffer: VecDeque::new(),
        }
    }

    pub fn empty() -> Self {
        Self {
            fetch_page: Box::new(|_, _| Ok(MediaPage::default())),
            next_from: None,
            page_size: 1,
            buffer: VecDeque::new(),
        }
    }
}

impl Iterator for MediaCursor<'_> {
    type Item = Result<MediaRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(media) = self.buffer.pop_front() {
                return Some(Ok(media));
            }
            let from = self.next_from?;
            match (self.fetch_page)(from, self.page_size) {
                Ok(page) => {
                    self.next_from = page.next_from;
                    self.buffer.extend(page.records);
                }
                Err(error) => {
                    self.next_from = None;
                    return Some(Err(error));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::cell::Cell;

    fn media(id: u64) -> MediaRecord {
        MediaRecord::new(id, "Post", "1", "default", "a.jpg")
    }

    #[test]
    fn fetches_pages_only_when_the_buffer_runs_dry() {
        let fetches = Cell::new(0);
        let mut cursor = MediaCursor::new(1, 2, |from, limit| {
            fetches.set(fetches.get() + 1);
            let records = (from..6).take(limit).map(media).collect();
            Ok(MediaPage::from_range(records, limit))
        });

        assert_eq!(fetches.get(), 0);
        assert_eq!(cursor.next().unwrap().unwrap().id, 1);
        assert_eq!(fetches.get(), 1);
        assert_eq!(cursor.next().unwrap().unwrap().id, 2);
        assert_eq!(fetches.get(), 1);
        assert_eq!(cursor.next().unwrap().unwrap().id, 3);
        assert_eq!(fetches.get(), 2);

        let rest: Vec<u64> = cursor.map(|media| media.unwrap().id).collect();
        assert_eq!(rest, vec![4, 5]);
        assert_eq!(fetches.get(), 3);
    }

    #[test]
    fn skips_empty_pages_that_still_point_forward() {
        let mut calls = 0;
        let cursor = MediaCursor::new(0, 10, move |from, _| {
            calls += 1;
            Ok(match calls {
                1 => MediaPage {
                    records: vec![],
                    next_from: Some(from + 10),
                },
                _ => MediaPage {
                    records: vec![media(from)],
                    next_from: None,
                },
            })
        });

        let ids: Vec<u64> = cursor.map(|media| media.unwrap().id).collect();
        assert_eq!(ids, vec![10]);
    }

    #[test]
    fn an_error_is_yielded_once_and_ends_the_stream() {
        let mut cursor = MediaCursor::new(0, 10, |_, _| Err(anyhow!("disk gone")));

        assert!(cursor.next().unwrap().is_err());
        assert!(cursor.next().is_none());
    }

    #[test]
    fn empty_cursor_yields_nothing() {
        assert!(MediaCursor::empty().next().is_none());
    }
}
