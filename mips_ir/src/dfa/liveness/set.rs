use tree_ir::Temp;

/// A set of temporaries, kept as a singly-linked list sorted by temp id without duplicates.
///
/// The cells live in a vector so [`union_in_place`](Self::union_in_place) can splice new cells
/// into the middle of the list without moving the existing ones.
#[derive(Debug, Clone, Default)]
pub struct LiveSet {
    cells: Vec<Cell>,
    head: Option<usize>,
    len: usize,
}

#[derive(Debug, Clone)]
struct Cell {
    temp: Temp,
    next: Option<usize>,
}

impl LiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn singleton(temp: Temp) -> Self {
        Self::from_sorted([temp])
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates over the temporaries in ascending order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            set: self,
            cursor: self.head,
        }
    }

    pub fn contains(&self, temp: Temp) -> bool {
        self.iter().take_while(|&t| t <= temp).any(|t| t == temp)
    }

    /// Builds a set from ascending temporaries, dropping any repeat of the previous one.
    fn from_sorted(temps: impl IntoIterator<Item = Temp>) -> Self {
        let mut set = Self::new();
        let mut tail: Option<usize> = None;
        for temp in temps {
            if let Some(tail) = tail {
                if set.cells[tail].temp == temp {
                    continue;
                }
            }
            let cell = set.push_cell(temp, None);
            match tail {
                Some(tail) => set.cells[tail].next = Some(cell),
                None => set.head = Some(cell),
            }
            tail = Some(cell);
        }
        set
    }

    fn push_cell(&mut self, temp: Temp, next: Option<usize>) -> usize {
        self.cells.push(Cell { temp, next });
        self.len += 1;
        self.cells.len() - 1
    }

    /// Returns `self ∪ other`.
    pub fn union(&self, other: &LiveSet) -> LiveSet {
        let mut xs = self.iter().peekable();
        let mut ys = other.iter().peekable();
        let merged = std::iter::from_fn(|| match (xs.peek(), ys.peek()) {
            (Some(&x), Some(&y)) if x <= y => xs.next(),
            (Some(_), Some(_)) => ys.next(),
            (Some(_), None) => xs.next(),
            (None, _) => ys.next(),
        });
        Self::from_sorted(merged)
    }

    /// Adds every element of `other` to `self`.
    ///
    /// New cells are spliced in while a single cursor walks `self` from front to back, so the
    /// existing cells are never copied and never visited twice.
    pub fn union_in_place(&mut self, other: &LiveSet) {
        if self.head.is_none() {
            *self = Self::from_sorted(other.iter());
            return;
        }

        let mut prev: Option<usize> = None;
        let mut cursor = self.head;
        for temp in other.iter() {
            while let Some(cell) = cursor {
                if self.cells[cell].temp >= temp {
                    break;
                }
                prev = cursor;
                cursor = self.cells[cell].next;
            }
            if let Some(cell) = cursor {
                if self.cells[cell].temp == temp {
                    continue;
                }
            }
            let new = self.push_cell(temp, cursor);
            match prev {
                Some(prev) => self.cells[prev].next = Some(new),
                None => self.head = Some(new),
            }
            prev = Some(new);
        }
    }

    /// Returns `self − other`.
    pub fn difference(&self, other: &LiveSet) -> LiveSet {
        let mut ys = other.iter().peekable();
        Self::from_sorted(self.iter().filter(|&x| {
            while ys.next_if(|&y| y < x).is_some() {}
            ys.peek() != Some(&x)
        }))
    }
}

impl PartialEq for LiveSet {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl Eq for LiveSet {}

impl FromIterator<Temp> for LiveSet {
    /// Collects temporaries in any order.
    fn from_iter<I: IntoIterator<Item = Temp>>(iter: I) -> Self {
        let mut set = Self::new();
        for temp in iter {
            set.union_in_place(&Self::singleton(temp));
        }
        set
    }
}

impl<'s> IntoIterator for &'s LiveSet {
    type Item = Temp;
    type IntoIter = Iter<'s>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct Iter<'s> {
    set: &'s LiveSet,
    cursor: Option<usize>,
}

impl Iterator for Iter<'_> {
    type Item = Temp;

    fn next(&mut self) -> Option<Temp> {
        let cell = &self.set.cells[self.cursor?];
        self.cursor = cell.next;
        Some(cell.temp)
    }
}
