use smallvec::SmallVec;

use crate::types::WordId;
use crate::word_list::WordList;
use crate::MAX_GLYPH_COUNT;

/// Structure tracking, for each cell of a slot, how many of the slot's remaining options place
/// each glyph in that cell. Indexed as `counts[cell_idx][glyph_id]`.
pub type GlyphCountsByCell = Vec<SmallVec<[u32; MAX_GLYPH_COUNT]>>;

/// Initialize the `glyph_counts_by_cell` structure for a slot. Words of any length may be
/// counted: a word only contributes to the cells it actually reaches, and letters past the end of
/// the slot are ignored.
#[must_use]
pub fn build_glyph_counts_by_cell(
    word_list: &WordList,
    slot_length: usize,
    options: &[WordId],
) -> GlyphCountsByCell {
    let mut result: GlyphCountsByCell = (0..slot_length)
        .map(|_| (0..word_list.glyphs.len()).map(|_| 0).collect())
        .collect();

    for &word_id in options {
        let word = &word_list.words[word_id];
        for (cell_idx, &glyph) in word.glyphs.iter().take(slot_length).enumerate() {
            result[cell_idx][glyph] += 1;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use crate::util::build_glyph_counts_by_cell;
    use crate::word_list::WordList;

    #[test]
    fn test_counts_only_reachable_cells() {
        let word_list = WordList::from_words(["AB", "ABC", "B"]);
        let a = word_list.glyph_id_by_char[&'A'];
        let b = word_list.glyph_id_by_char[&'B'];

        let counts = build_glyph_counts_by_cell(&word_list, 2, &[0, 1, 2]);

        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0][a], 2);
        assert_eq!(counts[0][b], 1);
        assert_eq!(counts[1][b], 2);
        assert_eq!(counts[1][a], 0);
    }
}
