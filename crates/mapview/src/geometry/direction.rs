use serde::{Deserialize, Serialize};

/// Compass direction in map space, declared in clockwise order from north.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction8 {
    #[serde(rename = "n")]
    North,
    #[serde(rename = "ne")]
    NorthEast,
    #[serde(rename = "e")]
    East,
    #[serde(rename = "se")]
    SouthEast,
    #[serde(rename = "s")]
    South,
    #[serde(rename = "sw")]
    SouthWest,
    #[serde(rename = "w")]
    West,
    #[serde(rename = "nw")]
    NorthWest,
}

impl Direction8 {
    pub const ALL: [Direction8; 8] = [
        Direction8::North,
        Direction8::NorthEast,
        Direction8::East,
        Direction8::SouthEast,
        Direction8::South,
        Direction8::SouthWest,
        Direction8::West,
        Direction8::NorthWest,
    ];

    /// Position in the clockwise ring starting at north.
    pub const fn clockwise_index(self) -> usize {
        self as usize
    }

    pub const fn from_clockwise_index(index: usize) -> Direction8 {
        Self::ALL[index % 8]
    }

    pub const fn cw(self) -> Direction8 {
        Self::from_clockwise_index(self.clockwise_index() + 1)
    }

    pub const fn ccw(self) -> Direction8 {
        Self::from_clockwise_index(self.clockwise_index() + 7)
    }

    pub const fn opposite(self) -> Direction8 {
        Self::from_clockwise_index(self.clockwise_index() + 4)
    }

    /// Map-space step `(dx, dy)`; y grows southward.
    pub const fn vector(self) -> (i32, i32) {
        match self {
            Direction8::North => (0, -1),
            Direction8::NorthEast => (1, -1),
            Direction8::East => (1, 0),
            Direction8::SouthEast => (1, 1),
            Direction8::South => (0, 1),
            Direction8::SouthWest => (-1, 1),
            Direction8::West => (-1, 0),
            Direction8::NorthWest => (-1, -1),
        }
    }

    /// Short name used inside sprite tags (`n1e0s1w0`, `road.road_ne`).
    pub const fn tileset_name(self) -> &'static str {
        match self {
            Direction8::North => "n",
            Direction8::NorthEast => "ne",
            Direction8::East => "e",
            Direction8::SouthEast => "se",
            Direction8::South => "s",
            Direction8::SouthWest => "sw",
            Direction8::West => "w",
            Direction8::NorthWest => "nw",
        }
    }
}

/// The four cardinal directions in the order terrain cells, blend quadrants and
/// iso darkness pieces are indexed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction4 {
    North,
    South,
    East,
    West,
}

impl Direction4 {
    pub const ALL: [Direction4; 4] = [
        Direction4::North,
        Direction4::South,
        Direction4::East,
        Direction4::West,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn to_dir8(self) -> Direction8 {
        match self {
            Direction4::North => Direction8::North,
            Direction4::South => Direction8::South,
            Direction4::East => Direction8::East,
            Direction4::West => Direction8::West,
        }
    }

    /// Cell letter in corner sprite tags: up, down, right, left.
    pub const fn cell_letter(self) -> char {
        match self {
            Direction4::North => 'u',
            Direction4::South => 'd',
            Direction4::East => 'r',
            Direction4::West => 'l',
        }
    }
}

/// Clockwise-ordered subset of [`Direction8`], starting from north.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirSet {
    dirs: Vec<Direction8>,
}

impl DirSet {
    /// Accepts only strictly clockwise (north-first) lists without repeats.
    pub fn new(dirs: Vec<Direction8>) -> Option<Self> {
        let ordered = dirs
            .windows(2)
            .all(|pair| pair[0].clockwise_index() < pair[1].clockwise_index());
        ordered.then_some(Self { dirs })
    }

    pub fn from_predicate(keep: impl Fn(Direction8) -> bool) -> Self {
        Self {
            dirs: Direction8::ALL.into_iter().filter(|dir| keep(*dir)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    pub fn as_slice(&self) -> &[Direction8] {
        &self.dirs
    }

    pub fn iter(&self) -> impl Iterator<Item = Direction8> + '_ {
        self.dirs.iter().copied()
    }

    pub fn contains(&self, dir: Direction8) -> bool {
        self.dirs.contains(&dir)
    }

    pub fn position(&self, dir: Direction8) -> Option<usize> {
        self.dirs.iter().position(|candidate| *candidate == dir)
    }

    pub fn is_subset_of(&self, other: &DirSet) -> bool {
        self.dirs.iter().all(|dir| other.contains(*dir))
    }

    /// `n1e0s1w0`-style name of a bitmask over this set (bit i = i-th direction).
    pub fn index_name(&self, index: usize) -> String {
        let mut name = String::new();
        for (bit, dir) in self.dirs.iter().enumerate() {
            name.push_str(dir.tileset_name());
            name.push(if index & (1 << bit) != 0 { '1' } else { '0' });
        }
        name
    }
}
