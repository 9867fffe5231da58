/// Dense, non-wrapping 2D grid addressed by signed coordinates.
use serde::{Deserialize, Serialize};

/// Every in-bounds coordinate holds exactly one value; out-of-bounds
/// lookups return `None` instead of panicking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGrid<T>", bound(deserialize = "T: Deserialize<'de>"))]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

#[derive(Deserialize)]
struct RawGrid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T> TryFrom<RawGrid<T>> for Grid<T> {
    type Error = String;

    fn try_from(raw: RawGrid<T>) -> Result<Self, Self::Error> {
        let expected = raw.width.checked_mul(raw.height).ok_or("grid size overflows")?;
        if raw.cells.len() != expected {
            return Err(format!(
                "grid of {}x{} needs {} cells, found {}",
                raw.width,
                raw.height,
                expected,
                raw.cells.len()
            ));
        }
        Ok(Self {
            width: raw.width,
            height: raw.height,
            cells: raw.cells,
        })
    }
}

impl<T> Grid<T> {
    /// Build a grid, initializing each cell from its coordinates.
    pub fn from_fn(width: usize, height: usize, mut init: impl FnMut(usize, usize) -> T) -> Self {
        let mut cells = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                cells.push(init(x, y));
            }
        }
        Self {
            width,
            height,
            cells,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Convert signed coordinates into an in-bounds `(x, y)` pair.
    pub fn checked(&self, x: i32, y: i32) -> Option<(usize, usize)> {
        let ux = usize::try_from(x).ok()?;
        let uy = usize::try_from(y).ok()?;
        (ux < self.width && uy < self.height).then_some((ux, uy))
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.checked(x, y).is_some()
    }

    pub fn get(&self, x: i32, y: i32) -> Option<&T> {
        let (ux, uy) = self.checked(x, y)?;
        self.cells.get(uy * self.width + ux)
    }

    pub fn get_mut(&mut self, x: i32, y: i32) -> Option<&mut T> {
        let (ux, uy) = self.checked(x, y)?;
        let width = self.width;
        self.cells.get_mut(uy * width + ux)
    }

    /// Cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.cells.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.cells.iter_mut()
    }

    /// In-bounds 4-connected neighbours (left, right, up, down).
    pub fn neighbors(&self, x: i32, y: i32) -> Vec<(i32, i32)> {
        [(x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)]
            .into_iter()
            .filter(|&(nx, ny)| self.contains(nx, ny))
            .collect()
    }
}
