use crate::{PortfolioError, Result};

/// Enlarged view of one item from a fixed gallery.
#[derive(Debug, Clone)]
pub struct Lightbox {
    len: usize,
    selected: Option<usize>,
}

impl Lightbox {
    pub fn new(len: usize) -> Self {
        Self {
            len,
            selected: None,
        }
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn is_open(&self) -> bool {
        self.selected.is_some()
    }

    pub fn open(&mut self, index: usize) -> Result<()> {
        if index >= self.len {
            return Err(PortfolioError::IndexOutOfRange {
                index,
                len: self.len,
            });
        }
        self.selected = Some(index);
        Ok(())
    }

    pub fn close(&mut self) {
        self.selected = None;
    }

    /// Keyboard handling while the lightbox has focus. Returns whether the
    /// key was consumed.
    pub fn handle_key(&mut self, key: &str) -> bool {
        if key == "Escape" && self.is_open() {
            self.close();
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_and_closes() {
        let mut lightbox = Lightbox::new(3);
        assert!(!lightbox.is_open());

        lightbox.open(2).unwrap();
        assert_eq!(lightbox.selected(), Some(2));

        lightbox.close();
        assert_eq!(lightbox.selected(), None);
    }

    #[test]
    fn escape_closes_only_when_open() {
        let mut lightbox = Lightbox::new(3);
        assert!(!lightbox.handle_key("Escape"));

        lightbox.open(0).unwrap();
        assert!(!lightbox.handle_key("Enter"));
        assert!(lightbox.handle_key("Escape"));
        assert!(!lightbox.is_open());
    }

    #[test]
    fn rejects_out_of_range_selection() {
        let mut lightbox = Lightbox::new(3);
        let err = lightbox.open(3).unwrap_err();
        assert!(matches!(err, PortfolioError::IndexOutOfRange { index: 3, len: 3 }));
        assert!(!lightbox.is_open());
    }
}
