//! Ordered list of overlay identifiers with one selected entry.

use crate::error::{PhotoboothError, PhotoboothResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameCatalog {
    overlays: Vec<String>,
    selected: usize,
}

impl FrameCatalog {
    /// Build a catalog; the first entry starts selected.
    ///
    /// Fails on an empty list or duplicate identifiers.
    pub fn new<I, S>(overlays: I) -> PhotoboothResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let overlays: Vec<String> = overlays.into_iter().map(Into::into).collect();
        if overlays.is_empty() {
            return Err(PhotoboothError::Other(
                "frame catalog needs at least one overlay".to_string(),
            ));
        }
        for (i, id) in overlays.iter().enumerate() {
            if overlays[..i].contains(id) {
                return Err(PhotoboothError::Other(format!(
                    "duplicate overlay in frame catalog: {}",
                    id
                )));
            }
        }
        Ok(Self {
            overlays,
            selected: 0,
        })
    }

    pub fn list(&self) -> &[String] {
        &self.overlays
    }

    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }

    /// Identifier of the selected overlay.
    pub fn selected(&self) -> &str {
        &self.overlays[self.selected]
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn select(&mut self, id: &str) -> PhotoboothResult<()> {
        let index = self
            .overlays
            .iter()
            .position(|o| o == id)
            .ok_or_else(|| PhotoboothError::UnknownOverlay(id.to_string()))?;
        self.selected = index;
        Ok(())
    }

    pub fn select_index(&mut self, index: usize) -> PhotoboothResult<()> {
        if index >= self.overlays.len() {
            return Err(PhotoboothError::UnknownOverlay(format!("#{}", index)));
        }
        self.selected = index;
        Ok(())
    }

    /// Select the following overlay, wrapping around.
    pub fn next(&mut self) -> &str {
        self.selected = (self.selected + 1) % self.overlays.len();
        self.selected()
    }

    /// Select the preceding overlay, wrapping around.
    pub fn previous(&mut self) -> &str {
        self.selected = (self.selected + self.overlays.len() - 1) % self.overlays.len();
        self.selected()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> FrameCatalog {
        FrameCatalog::new(["kana-frame.png", "sakura-frame.png", "polaroid-frame.png"]).unwrap()
    }

    #[test]
    fn test_first_entry_selected() {
        let catalog = catalog();
        assert_eq!(catalog.selected(), "kana-frame.png");
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn test_select_by_id_and_index() {
        let mut catalog = catalog();
        catalog.select("polaroid-frame.png").unwrap();
        assert_eq!(catalog.selected_index(), 2);

        catalog.select_index(1).unwrap();
        assert_eq!(catalog.selected(), "sakura-frame.png");

        assert!(matches!(
            catalog.select("missing.png"),
            Err(PhotoboothError::UnknownOverlay(_))
        ));
        assert!(catalog.select_index(3).is_err());
        // Failed selection keeps the previous one
        assert_eq!(catalog.selected(), "sakura-frame.png");
    }

    #[test]
    fn test_cycling_wraps() {
        let mut catalog = catalog();
        assert_eq!(catalog.previous(), "polaroid-frame.png");
        assert_eq!(catalog.next(), "kana-frame.png");
        assert_eq!(catalog.next(), "sakura-frame.png");
    }

    #[test]
    fn test_rejects_empty_and_duplicates() {
        assert!(FrameCatalog::new(Vec::<String>::new()).is_err());
        assert!(FrameCatalog::new(["a.png", "b.png", "a.png"]).is_err());
    }
}
