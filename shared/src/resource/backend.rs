use crate::error::LoadError;

/// One-shot callback a backend invokes when an asynchronous load settles.
/// Backends may call it synchronously from inside the request.
pub type Completion<T> = Box<dyn FnOnce(Result<T, LoadError>)>;

/// Fetches and decodes single images.
pub trait ImageBackend<I> {
    fn decode(&self, src: &str, done: Completion<I>);

    fn revoke_object_url(&self, url: &str);
}

/// Opens paged documents and rasterises individual pages.
pub trait DocumentBackend<I> {
    /// Open `src` and report its page count.
    fn open(&self, src: &str, done: Completion<u32>);

    /// Rasterise the 1-based `page` of a document previously opened from `src`.
    fn render_page(&self, src: &str, page: u32, done: Completion<I>);

    /// Drop the document opened from `src`. Later renders of it fail.
    fn close(&self, src: &str);

    fn revoke_object_url(&self, url: &str);
}
