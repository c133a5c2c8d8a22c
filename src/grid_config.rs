//! This module implements the static description of a puzzle: which cells are fillable, the slots
//! those cells form, and how the slots cross each other. Nothing here changes while a fill is in
//! progress.

use ab_glyph::FontRef;
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use std::collections::HashMap;
use std::fmt;
use std::fmt::Debug;
use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde_derive::{Deserialize, Serialize};

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::assignment::Assignment;
use crate::word_list::WordList;

/// An identifier for a given slot, based on its index in the `GridConfig`'s `slot_configs` field.
pub type SlotId = usize;

/// Zero-indexed row and column coords for a cell in the grid, where row 0 is the top row.
pub type GridCoord = (usize, usize);

/// The pair of cell offsets at which two slots cross: the first is the offset into the slot the
/// overlap was requested for, the second is the offset into the other slot.
pub type Overlap = (usize, usize);

/// The character marking a fillable cell in a structure file. Anything else is a block.
pub const FILLABLE_CELL: char = '_';

/// The character used for blocks when rendering a grid.
pub const BLOCK_CELL: char = '█';

/// The side length of one cell in a rendered image, in pixels.
pub const IMAGE_CELL_SIZE: u32 = 100;

/// The width of the black border drawn inside each cell of a rendered image.
pub const IMAGE_CELL_BORDER: u32 = 2;

const IMAGE_FONT_SIZE: f32 = 80.0;

/// Letters are drawn this many pixels above center, since their measured height includes room for
/// descenders.
const IMAGE_TEXT_RAISE: i32 = 10;

static IMAGE_FONT: &[u8] = include_bytes!("../resources/fonts/DejaVuSansMono.ttf");

const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// The direction that a slot is facing.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    Across,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Across => write!(f, "across"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// Errors that can be detected while turning a structure file into a `GridConfig`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    InvalidPath(String),
    EmptyGrid,
    ParallelSlotsOverlap(SlotSpec, SlotSpec),
    TooManySlotsInCell(GridCoord),
    InvalidFont,
    ImageWrite(String),
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::InvalidPath(path) => write!(f, "Can’t read file: “{path}”"),
            GridError::EmptyGrid => write!(f, "Grid must have at least one row and column"),
            GridError::ParallelSlotsOverlap(a, b) => {
                write!(f, "Parallel slots {a} and {b} share a cell")
            }
            GridError::TooManySlotsInCell((row, col)) => {
                write!(f, "More than two slots cross at cell ({row}, {col})")
            }
            GridError::InvalidFont => write!(f, "Can’t load the font used for rendering"),
            GridError::ImageWrite(path) => write!(f, "Can’t write image: “{path}”"),
        }
    }
}

impl std::error::Error for GridError {}

/// A struct representing a crossing between one slot and another, referencing the other slot's id
/// and the location of the intersection within the other slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crossing {
    pub other_slot_id: SlotId,
    pub other_slot_cell: usize,
}

/// A struct representing the aspects of a slot in the grid that are static during filling.
#[derive(Debug, Clone)]
pub struct SlotConfig {
    pub id: SlotId,
    pub start_cell: GridCoord,
    pub direction: Direction,
    pub length: usize,
    pub crossings: Vec<Option<Crossing>>,
}

impl SlotConfig {
    /// Generate the coords for each cell of this slot.
    #[must_use]
    pub fn cell_coords(&self) -> Vec<GridCoord> {
        self.slot_spec().cell_coords()
    }

    /// The overlap between this slot and the given slot, if they cross.
    #[must_use]
    pub fn overlap_with(&self, other_slot_id: SlotId) -> Option<Overlap> {
        self.crossings
            .iter()
            .enumerate()
            .find_map(|(cell_idx, crossing)| match crossing {
                Some(crossing) if crossing.other_slot_id == other_slot_id => {
                    Some((cell_idx, crossing.other_slot_cell))
                }
                _ => None,
            })
    }

    /// Iterate over the ids of the slots crossing this one.
    pub fn neighbors(&self) -> impl Iterator<Item = SlotId> + '_ {
        self.crossings
            .iter()
            .flatten()
            .map(|crossing| crossing.other_slot_id)
    }

    /// The number of slots crossing this one.
    #[must_use]
    pub fn degree(&self) -> usize {
        self.crossings.iter().flatten().count()
    }

    /// Generate a `SlotSpec` identifying this slot.
    #[must_use]
    pub fn slot_spec(&self) -> SlotSpec {
        SlotSpec {
            start_cell: self.start_cell,
            direction: self.direction,
            length: self.length,
        }
    }

    /// Generate a string key identifying this slot.
    #[must_use]
    pub fn slot_key(&self) -> String {
        self.slot_spec().to_key()
    }
}

/// A struct holding references to all of the information needed as input to a crossword filling
/// operation.
#[derive(Clone)]
pub struct GridConfig<'a> {
    /// The vocabulary used to fill the grid; see `word_list.rs`.
    pub word_list: &'a WordList,

    /// A flat array saying whether each cell is fillable, in order of row and then column.
    pub cells: &'a [bool],

    /// Config representing all of the slots in the grid and their crossings.
    pub slot_configs: &'a [SlotConfig],

    /// The width and height of the grid.
    pub width: usize,
    pub height: usize,

    /// An optional atomic flag that can be set to signal that the fill operation should be canceled.
    pub abort: Option<&'a AtomicBool>,
}

impl<'a> GridConfig<'a> {
    /// The overlap between slots `x` and `y`, expressed as (offset into x, offset into y).
    #[must_use]
    pub fn overlap(&self, x: SlotId, y: SlotId) -> Option<Overlap> {
        self.slot_configs[x].overlap_with(y)
    }

    /// Iterate over the ids of the slots crossing `slot_id`.
    pub fn neighbors(&self, slot_id: SlotId) -> impl Iterator<Item = SlotId> + 'a {
        let slot_configs: &'a [SlotConfig] = self.slot_configs;
        slot_configs[slot_id].neighbors()
    }

    /// The number of slots crossing `slot_id`.
    #[must_use]
    pub fn degree(&self, slot_id: SlotId) -> usize {
        self.slot_configs[slot_id].degree()
    }

    /// Is the cell at the given coords fillable?
    #[must_use]
    pub fn is_fillable(&self, (row, col): GridCoord) -> bool {
        row < self.height && col < self.width && self.cells[row * self.width + col]
    }
}

impl Debug for GridConfig<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridConfig")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("slot_configs", &self.slot_configs)
            .field("word_list", &self.word_list)
            .finish()
    }
}

/// A struct that owns a copy of each piece of information needed by `GridConfig`.
pub struct OwnedGridConfig {
    pub word_list: WordList,
    pub cells: Vec<bool>,
    pub slot_configs: Vec<SlotConfig>,
    pub width: usize,
    pub height: usize,
    pub abort: Option<Arc<AtomicBool>>,
}

impl OwnedGridConfig {
    #[must_use]
    pub fn to_config_ref(&self) -> GridConfig<'_> {
        GridConfig {
            word_list: &self.word_list,
            cells: &self.cells,
            slot_configs: &self.slot_configs,
            width: self.width,
            height: self.height,
            abort: self.abort.as_deref(),
        }
    }
}

/// A struct identifying a specific slot in the grid.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct SlotSpec {
    pub start_cell: GridCoord,
    pub direction: Direction,
    pub length: usize,
}

impl SlotSpec {
    /// Parse a string like "1,2,down,5" (row, column, direction, length) into a `SlotSpec`.
    pub fn from_key(key: &str) -> Result<SlotSpec, String> {
        let key_parts: Vec<&str> = key.split(',').collect();
        if key_parts.len() != 4 {
            return Err(format!("invalid slot key: {key}"));
        }

        let row: Result<usize, _> = key_parts[0].parse();
        let col: Result<usize, _> = key_parts[1].parse();
        let direction: Option<Direction> = match key_parts[2] {
            "across" => Some(Direction::Across),
            "down" => Some(Direction::Down),
            _ => None,
        };
        let length: Result<usize, _> = key_parts[3].parse();

        if let (Ok(row), Ok(col), Some(direction), Ok(length)) = (row, col, direction, length) {
            Ok(SlotSpec {
                start_cell: (row, col),
                direction,
                length,
            })
        } else {
            Err(format!("invalid slot key: {key:?}"))
        }
    }

    /// Represent this slot as a string like "1,2,down,5".
    #[must_use]
    pub fn to_key(&self) -> String {
        format!(
            "{},{},{},{}",
            self.start_cell.0, self.start_cell.1, self.direction, self.length,
        )
    }

    /// Does this spec match the given slot config?
    #[must_use]
    pub fn matches_slot(&self, slot: &SlotConfig) -> bool {
        self.start_cell == slot.start_cell
            && self.direction == slot.direction
            && self.length == slot.length
    }

    /// Generate the coords for each cell of this entry.
    #[must_use]
    pub fn cell_coords(&self) -> Vec<GridCoord> {
        (0..self.length)
            .map(|cell_idx| match self.direction {
                Direction::Across => (self.start_cell.0, self.start_cell.1 + cell_idx),
                Direction::Down => (self.start_cell.0 + cell_idx, self.start_cell.1),
            })
            .collect()
    }
}

impl fmt::Display for SlotSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}) {} : {}",
            self.start_cell.0, self.start_cell.1, self.direction, self.length
        )
    }
}

/// Serialize a `SlotSpec` into a string key.
#[cfg(feature = "serde")]
impl Serialize for SlotSpec {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_key())
    }
}

/// Deserialize a `SlotSpec` from a string key.
#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for SlotSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw_string = String::deserialize(deserializer)?;
        SlotSpec::from_key(&raw_string).map_err(serde::de::Error::custom)
    }
}

/// The fillable/blocked layout of a grid, as read from a structure file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridStructure {
    pub cells: Vec<bool>,
    pub width: usize,
    pub height: usize,
}

impl GridStructure {
    #[must_use]
    pub fn is_fillable(&self, (row, col): GridCoord) -> bool {
        row < self.height && col < self.width && self.cells[row * self.width + col]
    }
}

/// Parse a structure string with `_` representing fillable cells and any other character
/// representing blocks. Rows shorter than the longest row are padded with blocks.
pub fn parse_structure(contents: &str) -> Result<GridStructure, GridError> {
    let lines: Vec<Vec<char>> = contents
        .lines()
        .map(|line| line.trim_end_matches('\r').chars().collect())
        .collect();

    let height = lines.len();
    let width = lines.iter().map(Vec::len).max().unwrap_or(0);
    if height == 0 || width == 0 {
        return Err(GridError::EmptyGrid);
    }

    let cells = lines
        .iter()
        .flat_map(|line| {
            (0..width).map(move |col| line.get(col).map_or(false, |&c| c == FILLABLE_CELL))
        })
        .collect();

    Ok(GridStructure {
        cells,
        width,
        height,
    })
}

/// Generate a list of `SlotSpec`s for every maximal run of at least two fillable cells, first all
/// across slots in reading order and then all down slots.
#[must_use]
pub fn generate_slots_from_structure(structure: &GridStructure) -> Vec<SlotSpec> {
    let mut slot_specs: Vec<SlotSpec> = vec![];

    for direction in [Direction::Across, Direction::Down] {
        for row in 0..structure.height {
            for col in 0..structure.width {
                let step = |(r, c): GridCoord, k: usize| match direction {
                    Direction::Across => (r, c + k),
                    Direction::Down => (r + k, c),
                };
                let prev = match direction {
                    Direction::Across => col.checked_sub(1).map(|c| (row, c)),
                    Direction::Down => row.checked_sub(1).map(|r| (r, col)),
                };

                let starts_word = structure.is_fillable((row, col))
                    && prev.map_or(true, |prev| !structure.is_fillable(prev));
                if !starts_word {
                    continue;
                }

                let length = (0..)
                    .take_while(|&k| structure.is_fillable(step((row, col), k)))
                    .count();

                if length > 1 {
                    slot_specs.push(SlotSpec {
                        start_cell: (row, col),
                        direction,
                        length,
                    });
                }
            }
        }
    }

    slot_specs
}

/// Given `SlotSpec`s specifying the positions of the slots in a grid, generate `SlotConfig`s
/// containing derived information about crossings.
pub fn generate_slot_configs(entries: &[SlotSpec]) -> Result<Vec<SlotConfig>, GridError> {
    // Build a map from cell location to entries involved, which we can then use to calculate
    // crossings.
    let mut entries_by_loc: HashMap<GridCoord, Vec<(usize, usize)>> = HashMap::new();

    for (entry_idx, entry) in entries.iter().enumerate() {
        for (cell_idx, loc) in entry.cell_coords().into_iter().enumerate() {
            let cell_entries = entries_by_loc.entry(loc).or_default();

            if let Some(&(other_idx, _)) = cell_entries
                .iter()
                .find(|&&(other_idx, _)| entries[other_idx].direction == entry.direction)
            {
                return Err(GridError::ParallelSlotsOverlap(
                    entries[other_idx].clone(),
                    entry.clone(),
                ));
            }
            if cell_entries.len() > 1 {
                return Err(GridError::TooManySlotsInCell(loc));
            }

            cell_entries.push((entry_idx, cell_idx));
        }
    }

    let mut slot_configs: Vec<SlotConfig> = Vec::with_capacity(entries.len());

    for (entry_idx, entry) in entries.iter().enumerate() {
        let crossings: Vec<Option<Crossing>> = entry
            .cell_coords()
            .iter()
            .map(|loc| {
                let &(other_slot_id, other_slot_cell) = entries_by_loc[loc]
                    .iter()
                    .find(|&&(other_idx, _)| other_idx != entry_idx)?;

                Some(Crossing {
                    other_slot_id,
                    other_slot_cell,
                })
            })
            .collect();

        slot_configs.push(SlotConfig {
            id: entry_idx,
            start_cell: entry.start_cell,
            direction: entry.direction,
            length: entry.length,
            crossings,
        });
    }

    Ok(slot_configs)
}

/// Generate an `OwnedGridConfig` representing a grid with the given structure and entries.
pub fn generate_grid_config(
    word_list: WordList,
    structure: GridStructure,
    entries: &[SlotSpec],
) -> Result<OwnedGridConfig, GridError> {
    let slot_configs = generate_slot_configs(entries)?;

    Ok(OwnedGridConfig {
        word_list,
        cells: structure.cells,
        slot_configs,
        width: structure.width,
        height: structure.height,
        abort: None,
    })
}

/// Generate an `OwnedGridConfig` from a structure string with `_` representing fillable cells.
pub fn generate_grid_config_from_structure_string(
    word_list: WordList,
    structure: &str,
) -> Result<OwnedGridConfig, GridError> {
    let structure = parse_structure(structure)?;
    let slot_specs = generate_slots_from_structure(&structure);

    generate_grid_config(word_list, structure, &slot_specs)
}

/// Read a structure file from disk and generate an `OwnedGridConfig` from it.
pub fn load_grid_config<P: AsRef<Path>>(
    word_list: WordList,
    structure_path: P,
) -> Result<OwnedGridConfig, GridError> {
    let structure_path = structure_path.as_ref();
    let contents = fs::read_to_string(structure_path)
        .map_err(|_| GridError::InvalidPath(structure_path.display().to_string()))?;

    generate_grid_config_from_structure_string(word_list, &contents)
}

/// The contents of each cell, in order of row and then column: `None` for blocks, a space for
/// fillable cells that no assigned word covers, and otherwise the letter placed there.
fn letter_grid(config: &GridConfig, assignment: &Assignment) -> Vec<Option<char>> {
    let mut grid: Vec<Option<char>> = (0..config.height)
        .flat_map(|row| (0..config.width).map(move |col| (row, col)))
        .map(|loc| config.is_fillable(loc).then_some(' '))
        .collect();

    for (slot_id, word_id) in assignment.iter() {
        let slot_config = &config.slot_configs[slot_id];
        let word = &config.word_list.words[word_id];

        for ((row, col), &glyph) in slot_config.cell_coords().into_iter().zip(&word.glyphs) {
            grid[row * config.width + col] = Some(config.word_list.glyphs[glyph]);
        }
    }

    grid
}

/// Turn the given grid config and assignment into a rendered string, with blocks drawn as `█`
/// and unfilled cells left blank.
#[must_use]
pub fn render_grid(config: &GridConfig, assignment: &Assignment) -> String {
    letter_grid(config, assignment)
        .chunks(config.width)
        .map(|line| {
            line.iter()
                .map(|cell| cell.unwrap_or(BLOCK_CELL))
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Draw the grid as an image: each cell is an `IMAGE_CELL_SIZE` square, blocks are solid black,
/// and fillable cells are white inside a thin black border, with their letter (if any) centered.
pub fn render_image(config: &GridConfig, assignment: &Assignment) -> Result<RgbaImage, GridError> {
    let font = FontRef::try_from_slice(IMAGE_FONT).map_err(|_| GridError::InvalidFont)?;
    let interior_size = IMAGE_CELL_SIZE - 2 * IMAGE_CELL_BORDER;

    let mut img = RgbaImage::from_pixel(
        config.width as u32 * IMAGE_CELL_SIZE,
        config.height as u32 * IMAGE_CELL_SIZE,
        BLACK,
    );

    for (cell_idx, cell) in letter_grid(config, assignment).into_iter().enumerate() {
        let Some(letter) = cell else {
            continue;
        };
        let (row, col) = (cell_idx / config.width, cell_idx % config.width);
        let left = (col as u32 * IMAGE_CELL_SIZE + IMAGE_CELL_BORDER) as i32;
        let top = (row as u32 * IMAGE_CELL_SIZE + IMAGE_CELL_BORDER) as i32;

        draw_filled_rect_mut(
            &mut img,
            Rect::at(left, top).of_size(interior_size, interior_size),
            WHITE,
        );

        if letter == ' ' {
            continue;
        }

        let text = letter.to_string();
        let (text_width, text_height) = text_size(IMAGE_FONT_SIZE, &font, &text);
        draw_text_mut(
            &mut img,
            BLACK,
            left + (interior_size as i32 - text_width as i32) / 2,
            top + (interior_size as i32 - text_height as i32) / 2 - IMAGE_TEXT_RAISE,
            IMAGE_FONT_SIZE,
            &font,
            &text,
        );
    }

    Ok(img)
}

/// Render the grid with `render_image` and write it to the given path as a PNG.
pub fn save_image<P: AsRef<Path>>(
    config: &GridConfig,
    assignment: &Assignment,
    path: P,
) -> Result<(), GridError> {
    let path = path.as_ref();

    render_image(config, assignment)?
        .save(path)
        .map_err(|_| GridError::ImageWrite(path.display().to_string()))
}
