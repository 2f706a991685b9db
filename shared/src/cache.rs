use crate::surface::Bitmap;

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<I> {
    pub url: String,
    pub page: i32,
    pub image: I,
}

/// Decoded page bitmaps keyed by `(url, page)`.
///
/// At most one entry exists per key. Entries are never evicted one by one;
/// they live until `dispose_all`, which also hands every object URL held by
/// a cached bitmap to the supplied revoker.
#[derive(Debug)]
pub struct ImageCache<I> {
    entries: Vec<CacheEntry<I>>,
}

impl<I> Default for ImageCache<I> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<I: Bitmap> ImageCache<I> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CacheEntry<I>] {
        &self.entries
    }

    pub fn get(&self, url: &str, page: i32) -> Option<&I> {
        self.entries
            .iter()
            .find(|entry| entry.url == url && entry.page == page)
            .map(|entry| &entry.image)
    }

    /// Upsert. Returns the bitmap previously stored under the key, if any.
    pub fn save(&mut self, url: &str, page: i32, image: I) -> Option<I> {
        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|entry| entry.url == url && entry.page == page)
        {
            return Some(std::mem::replace(&mut existing.image, image));
        }

        self.entries.push(CacheEntry {
            url: url.to_string(),
            page,
            image,
        });
        None
    }

    /// Return the cached bitmap for the key, creating it with `create` first
    /// if absent. Lookup and insert happen under one borrow.
    pub fn get_or_insert_with(&mut self, url: &str, page: i32, create: impl FnOnce() -> I) -> &I {
        let index = match self
            .entries
            .iter()
            .position(|entry| entry.url == url && entry.page == page)
        {
            Some(index) => index,
            None => {
                self.entries.push(CacheEntry {
                    url: url.to_string(),
                    page,
                    image: create(),
                });
                self.entries.len() - 1
            }
        };
        &self.entries[index].image
    }

    /// Revoke every object URL held by cached bitmaps and clear the cache.
    pub fn dispose_all(&mut self, mut revoke: impl FnMut(&str)) {
        for entry in self.entries.drain(..) {
            if let Some(url) = entry.image.object_url() {
                revoke(url);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::recording::TestImage;

    #[test]
    fn save_then_get() {
        let mut cache = ImageCache::new();
        assert!(cache.get("doc.pdf", 1).is_none());
        assert!(cache.save("doc.pdf", 1, TestImage::new(10.0, 20.0)).is_none());
        assert_eq!(cache.get("doc.pdf", 1), Some(&TestImage::new(10.0, 20.0)));
        assert!(cache.get("doc.pdf", 2).is_none());
        assert!(cache.get("other.pdf", 1).is_none());
    }

    #[test]
    fn save_same_key_overwrites_in_place() {
        let mut cache = ImageCache::new();
        cache.save("doc.pdf", 3, TestImage::new(1.0, 1.0));
        cache.save("doc.pdf", 4, TestImage::new(4.0, 4.0));
        let previous = cache.save("doc.pdf", 3, TestImage::new(2.0, 2.0));

        assert_eq!(previous, Some(TestImage::new(1.0, 1.0)));
        assert_eq!(cache.len(), 2);
        let matching: Vec<_> = cache
            .entries()
            .iter()
            .filter(|e| e.url == "doc.pdf" && e.page == 3)
            .collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].image, TestImage::new(2.0, 2.0));
    }

    #[test]
    fn get_or_insert_only_creates_once() {
        let mut cache = ImageCache::new();
        let mut created = 0;
        cache.get_or_insert_with("a.pdf", 1, || {
            created += 1;
            TestImage::new(5.0, 5.0)
        });
        let image = cache
            .get_or_insert_with("a.pdf", 1, || {
                created += 1;
                TestImage::new(9.0, 9.0)
            })
            .clone();
        assert_eq!(created, 1);
        assert_eq!(image, TestImage::new(5.0, 5.0));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn dispose_revokes_object_urls_and_clears() {
        let mut cache = ImageCache::new();
        cache.save("a.pdf", 1, TestImage::with_url(1.0, 1.0, "blob:one"));
        cache.save("a.pdf", 2, TestImage::new(1.0, 1.0));
        cache.save("b.pdf", 1, TestImage::with_url(1.0, 1.0, "blob:two"));

        let mut revoked = Vec::new();
        cache.dispose_all(|url| revoked.push(url.to_string()));

        assert_eq!(revoked, vec!["blob:one", "blob:two"]);
        assert!(cache.is_empty());
    }
}
