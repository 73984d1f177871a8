//! External graphics states.

use pdf_writer::{Chunk, Finish, Ref};

/// A graphics state setting a constant opacity for both stroking and filling.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub(crate) struct ExtGState {
    alpha: u8,
}

impl ExtGState {
    pub(crate) fn new(alpha: u8) -> Self {
        Self { alpha }
    }

    pub(crate) fn serialize(self, root_ref: Ref) -> Chunk {
        let mut chunk = Chunk::new();
        let alpha = self.alpha as f32 / 255.0;

        let mut ext_st = chunk.ext_graphics(root_ref);
        ext_st.stroking_alpha(alpha);
        ext_st.non_stroking_alpha(alpha);
        ext_st.finish();

        chunk
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sets_both_alphas() {
        let chunk = ExtGState::new(51).serialize(Ref::new(7));
        let text = String::from_utf8_lossy(chunk.as_bytes()).into_owned();

        assert!(text.starts_with("7 0 obj"));
        assert!(text.contains("/CA 0.2"));
        assert!(text.contains("/ca 0.2"));
    }
}
