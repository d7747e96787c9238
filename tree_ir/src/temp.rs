use std::rc::Rc;

/// A temporary: an abstract register.
///
/// Ids below the factory's first virtual id are reserved for precoloured machine registers.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Temp(u32);

impl Temp {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Debug for Temp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}

impl std::fmt::Display for Temp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// A symbolic machine-code address.
///
/// Besides real labels there are holes: placeholders for a jump destination that isn't known
/// yet. A hole never equals a real label, whatever their names.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Label {
    name: Rc<str>,
    hole: bool,
}

impl Label {
    pub fn is_hole(&self) -> bool {
        self.hole
    }
}

impl AsRef<str> for Label {
    fn as_ref(&self) -> &str {
        self.name.as_ref()
    }
}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Self {
            name: Rc::from(value),
            hole: false,
        }
    }
}

impl From<String> for Label {
    fn from(value: String) -> Self {
        Self {
            name: Rc::from(value),
            hole: false,
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.hole {
            f.write_str("?")?;
        }
        f.write_str(&self.name)
    }
}

/// Generates fresh temporaries and labels for one compilation session.
#[derive(Debug, Clone)]
pub struct TempFactory {
    next_temp: u32,
    next_label: u32,
}

impl TempFactory {
    /// Creates a factory whose first fresh temporary has id `first_virtual`.
    pub fn new(first_virtual: u32) -> Self {
        Self {
            next_temp: first_virtual,
            next_label: 0,
        }
    }

    pub fn new_temp(&mut self) -> Temp {
        let n = self.next_temp;
        self.next_temp += 1;
        Temp(n)
    }

    pub fn new_label(&mut self) -> Label {
        let n = self.next_label;
        self.next_label += 1;
        Label::from(format!("L{n}"))
    }

    /// A fresh hole, to be patched with a real label later. Shares the numbering of
    /// [`new_label`](Self::new_label).
    pub fn new_hole(&mut self) -> Label {
        Label {
            hole: true,
            ..self.new_label()
        }
    }

    pub fn named_label(&self, name: &str) -> Label {
        Label::from(name)
    }

    /// The id the next call to [`new_temp`](Self::new_temp) will hand out.
    pub fn peek_temp(&self) -> u32 {
        self.next_temp
    }
}
