/// Value stack a native runtime function executes against.
///
/// This is the whole call surface a resolved link needs; the bytecode
/// interpreter that would drive `Prog` dispatches lives elsewhere.
#[derive(Debug)]
pub struct ExecState {
    pub stack: Vec<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct ExecStateCreateInfo {
    pub stack_size: usize,
}

impl ExecState {
    pub fn new(info: &ExecStateCreateInfo) -> Self {
        Self {
            stack: Vec::with_capacity(info.stack_size),
        }
    }

    pub fn push(&mut self, value: i64) {
        self.stack.push(value);
    }

    pub fn pop(&mut self) -> Option<i64> {
        self.stack.pop()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pop_order() {
        let mut state = ExecState::new(&ExecStateCreateInfo { stack_size: 4 });
        state.push(1);
        state.push(2);
        assert_eq!(state.depth(), 2);
        assert_eq!(state.pop(), Some(2));
        assert_eq!(state.pop(), Some(1));
        assert_eq!(state.pop(), None);
    }
}
