use crate::models::ChapterDescriptor;

/// A visible line of the chapter picker.
///
/// `index` is the position in the full chapter list, never the position in
/// the filtered view, so selecting an entry always loads the right chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerEntry {
    pub index: usize,
    pub label: String,
}

/// One entry per chapter, in manifest order.
pub fn populate_chapter_list<'a, I>(chapters: I) -> Vec<PickerEntry>
where
    I: IntoIterator<Item = (usize, &'a ChapterDescriptor)>,
{
    chapters
        .into_iter()
        .map(|(index, chapter)| PickerEntry {
            index,
            label: chapter.label(),
        })
        .collect()
}

/// Case-insensitive title substring filter over the canonical list.
/// An empty query keeps every chapter.
pub fn filter_chapters(chapters: &[ChapterDescriptor], query: &str) -> Vec<PickerEntry> {
    let needle = query.to_lowercase();
    populate_chapter_list(
        chapters
            .iter()
            .enumerate()
            .filter(|(_, chapter)| chapter.title.to_lowercase().contains(&needle)),
    )
}

/// Picker overlay state: query text, filtered entries, and the highlighted row.
#[derive(Debug, Clone, Default)]
pub struct ChapterPicker {
    query: String,
    entries: Vec<PickerEntry>,
    selected: usize,
}

impl ChapterPicker {
    pub fn open(chapters: &[ChapterDescriptor], current: usize) -> Self {
        let entries = filter_chapters(chapters, "");
        let selected = entries.iter().position(|e| e.index == current).unwrap_or(0);
        Self {
            query: String::new(),
            entries,
            selected,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn entries(&self) -> &[PickerEntry] {
        &self.entries
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn push_char(&mut self, chapters: &[ChapterDescriptor], c: char) {
        self.query.push(c);
        self.refilter(chapters);
    }

    pub fn pop_char(&mut self, chapters: &[ChapterDescriptor]) {
        if self.query.pop().is_some() {
            self.refilter(chapters);
        }
    }

    fn refilter(&mut self, chapters: &[ChapterDescriptor]) {
        self.entries = filter_chapters(chapters, &self.query);
        self.selected = 0;
    }

    pub fn move_selection(&mut self, delta: isize) {
        if self.entries.is_empty() {
            return;
        }
        let last = self.entries.len() - 1;
        self.selected = self.selected.saturating_add_signed(delta).min(last);
    }

    /// Canonical chapter index of the highlighted entry.
    pub fn selected_chapter(&self) -> Option<usize> {
        self.entries.get(self.selected).map(|e| e.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chapters() -> Vec<ChapterDescriptor> {
        ["Prologue", "The Awakening", "Into the Forest", "Awake Again"]
            .iter()
            .enumerate()
            .map(|(i, title)| ChapterDescriptor {
                number: i as u32 + 1,
                title: title.to_string(),
                file: format!("{}.txt", i + 1),
            })
            .collect()
    }

    #[test]
    fn empty_query_lists_everything_in_order() {
        let entries = filter_chapters(&chapters(), "");
        let indices: Vec<usize> = entries.iter().map(|e| e.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert_eq!(entries[1].label, "2: The Awakening");
    }

    #[test]
    fn filter_is_case_insensitive_and_keeps_canonical_index() {
        let entries = filter_chapters(&chapters(), "AWAK");
        let indices: Vec<usize> = entries.iter().map(|e| e.index).collect();
        assert_eq!(indices, vec![1, 3]);
    }

    #[test]
    fn selecting_filtered_entry_maps_to_canonical_chapter() {
        let list = chapters();
        let mut picker = ChapterPicker::open(&list, 0);
        for c in "awake".chars() {
            picker.push_char(&list, c);
        }
        picker.move_selection(1);
        assert_eq!(picker.selected(), 1);
        assert_eq!(picker.selected_chapter(), Some(3));
    }

    #[test]
    fn open_highlights_current_chapter() {
        let list = chapters();
        let picker = ChapterPicker::open(&list, 2);
        assert_eq!(picker.selected_chapter(), Some(2));
    }

    #[test]
    fn backspace_widens_the_filter() {
        let list = chapters();
        let mut picker = ChapterPicker::open(&list, 0);
        picker.push_char(&list, 'z');
        assert!(picker.entries().is_empty());
        assert_eq!(picker.selected_chapter(), None);
        picker.move_selection(1);

        picker.pop_char(&list);
        assert_eq!(picker.query(), "");
        assert_eq!(picker.entries().len(), 4);
    }

    #[test]
    fn selection_is_clamped() {
        let list = chapters();
        let mut picker = ChapterPicker::open(&list, 0);
        picker.move_selection(-3);
        assert_eq!(picker.selected(), 0);
        picker.move_selection(10);
        assert_eq!(picker.selected(), 3);
    }
}
