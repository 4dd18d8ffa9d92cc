use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskState {
    /// Still a candidate
    White,
    /// Excluded by a filter pass, restorable when nothing else survives
    Grey,
    /// Permanently excluded
    Black,
}

/// Per-candidate filter state for one steering pass. Owned by value and
/// handed from pass to pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    states: SmallVec<[MaskState; 8]>,
}

impl Mask {
    pub fn all_white(len: usize) -> Self {
        Self {
            states: SmallVec::from_elem(MaskState::White, len),
        }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn get(&self, index: usize) -> MaskState {
        self.states[index]
    }

    pub fn set(&mut self, index: usize, state: MaskState) {
        self.states[index] = state;
    }

    pub fn is_white(&self, index: usize) -> bool {
        self.states[index] == MaskState::White
    }

    pub fn whites(&self) -> impl Iterator<Item = usize> + '_ {
        self.states
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == MaskState::White)
            .map(|(i, _)| i)
    }

    pub fn has_white(&self) -> bool {
        self.states.contains(&MaskState::White)
    }

    pub fn white_count(&self) -> usize {
        self.whites().count()
    }

    /// Turn every grey entry back to white.
    pub fn restore_greys(&mut self) {
        for state in self.states.iter_mut() {
            if *state == MaskState::Grey {
                *state = MaskState::White;
            }
        }
    }
}
