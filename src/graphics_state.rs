//! The graphics state stack.
//!
//! Pictures save and restore their drawing attributes in a stack-like fashion. The
//! states live in an arena, each one pointing to the state it was pushed on top of,
//! so that origin and scale changes can be composed with those of the parent.
//!
//! Pushing and popping is mirrored to `q`/`Q` in the content stream, unless a clip
//! path is being collected: the path operators must not be interrupted. Every state
//! remembers whether its push emitted a `q`, so the matching `Q` is emitted exactly
//! when needed.

use crate::color::Rgba;
use crate::content::LineStyle;
use crate::error::{OpError, OpResult};
use crate::geom::{PdfSystem, Point};
use crate::picture::{DrawingMode, FontSpec, Pattern};

/// The drawing attributes of a picture.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GraphicsState {
    pub(crate) pen_location: Point,
    pub(crate) line_style: LineStyle,
    pub(crate) fore_color: Rgba,
    pub(crate) back_color: Rgba,
    pub(crate) pattern: Pattern,
    pub(crate) drawing_mode: DrawingMode,
    pub(crate) font: FontSpec,
    pub(crate) system: PdfSystem,
    /// Paths are collected into a clip path instead of being painted.
    pub(crate) clipping: bool,
    emitted_q: bool,
    parent: Option<usize>,
}

impl GraphicsState {
    pub(crate) fn new(system: PdfSystem) -> Self {
        Self {
            pen_location: Point::default(),
            line_style: LineStyle::default(),
            fore_color: Rgba::black(),
            back_color: Rgba::white(),
            pattern: Pattern::SOLID_HIGH,
            drawing_mode: DrawingMode::Copy,
            font: FontSpec::default(),
            system,
            clipping: false,
            emitted_q: false,
            parent: None,
        }
    }
}

#[derive(Debug)]
pub(crate) struct GraphicsStates {
    states: Vec<GraphicsState>,
    depth: usize,
}

impl GraphicsStates {
    /// Create a new stack containing only the root state.
    pub(crate) fn new(root: GraphicsState) -> Self {
        Self {
            states: vec![root],
            depth: 0,
        }
    }

    pub(crate) fn cur(&self) -> &GraphicsState {
        &self.states[self.states.len() - 1]
    }

    pub(crate) fn cur_mut(&mut self) -> &mut GraphicsState {
        let last = self.states.len() - 1;
        &mut self.states[last]
    }

    /// The number of pushed states, `0` when only the root is left.
    pub(crate) fn depth(&self) -> usize {
        self.depth
    }

    /// Push a copy of the current state. Returns whether a `q` must be emitted.
    pub(crate) fn save_state(&mut self) -> bool {
        let emit = !self.cur().clipping;
        self.push(emit);
        emit
    }

    /// Push a copy of the current state that has no counterpart in the content
    /// stream, used around pictures and clip paths.
    pub(crate) fn push_internal(&mut self) {
        self.push(false);
    }

    fn push(&mut self, emitted_q: bool) {
        let parent = self.states.len() - 1;
        let mut state = self.cur().clone();
        state.emitted_q = emitted_q;
        state.parent = Some(parent);

        self.states.push(state);
        self.depth += 1;
    }

    /// Pop the current state. Returns whether a `Q` must be emitted.
    pub(crate) fn restore_state(&mut self) -> OpResult<bool> {
        if self.depth == 0 {
            return Err(OpError::StackUnderflow);
        }

        let state = self.states.pop().ok_or(OpError::StackUnderflow)?;
        self.depth -= 1;

        Ok(state.emitted_q)
    }

    fn parent_system(&self) -> PdfSystem {
        let cur = self.cur();

        match cur.parent {
            Some(parent) => self.states[parent].system,
            None => cur.system,
        }
    }

    /// Move the origin relative to the origin of the parent state.
    pub(crate) fn set_origin(&mut self, p: Point) {
        let parent = self.parent_system();
        let origin = parent.origin();

        self.cur_mut().system.set_origin(Point::new(
            origin.x + parent.scaled(p.x),
            origin.y + parent.scaled(p.y),
        ));
    }

    /// Scale relative to the scale of the parent state.
    pub(crate) fn set_scale(&mut self, scale: f32) {
        let parent = self.parent_system();
        self.cur_mut().system.set_scale(parent.scale() * scale);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack() -> GraphicsStates {
        GraphicsStates::new(GraphicsState::new(PdfSystem::new(842.0, 10.0, 20.0)))
    }

    #[test]
    fn push_three_pop_four() {
        let mut states = stack();

        for _ in 0..3 {
            assert!(states.save_state());
        }

        assert_eq!(states.depth(), 3);

        for _ in 0..3 {
            assert_eq!(states.restore_state(), Ok(true));
        }

        assert_eq!(states.restore_state(), Err(OpError::StackUnderflow));
        assert_eq!(states.depth(), 0);
        assert_eq!(states.cur().system.origin(), Point::new(10.0, 20.0));
    }

    #[test]
    fn no_q_while_clipping() {
        let mut states = stack();
        states.cur_mut().clipping = true;

        assert!(!states.save_state());
        assert_eq!(states.restore_state(), Ok(false));
    }

    #[test]
    fn internal_states_emit_nothing() {
        let mut states = stack();
        states.push_internal();
        assert_eq!(states.depth(), 1);
        assert_eq!(states.restore_state(), Ok(false));
    }

    #[test]
    fn origin_and_scale_compose_with_the_parent() {
        let mut states = stack();
        states.save_state();
        states.set_scale(2.0);
        states.save_state();
        states.set_origin(Point::new(5.0, 5.0));
        states.set_scale(0.5);

        let system = states.cur().system;
        assert_eq!(system.origin(), Point::new(20.0, 30.0));
        assert_eq!(system.scale(), 1.0);

        // Setting the origin twice doesn't accumulate.
        states.set_origin(Point::new(5.0, 5.0));
        assert_eq!(states.cur().system.origin(), Point::new(20.0, 30.0));

        states.restore_state().unwrap();
        assert_eq!(states.cur().system.scale(), 2.0);
    }

    #[test]
    fn pushed_state_inherits_attributes() {
        let mut states = stack();
        states.cur_mut().fore_color = Rgba::rgb(1, 2, 3);
        states.save_state();
        states.cur_mut().fore_color = Rgba::rgb(4, 5, 6);
        states.restore_state().unwrap();

        assert_eq!(states.cur().fore_color, Rgba::rgb(1, 2, 3));
    }
}
