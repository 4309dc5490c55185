/// Read access to the page's current navigation URL
pub trait Location {
    /// Current query string, including the leading `?` when non-empty
    fn search(&self) -> String;
}
