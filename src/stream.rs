//! Stream filters.
//!
//! Every stream the driver writes (page contents, images, masks, pattern cells and
//! embedded font files) goes through a [`FilterStreamBuilder`], which applies the
//! job's compression setting and records the filters in the stream dictionary.

use std::borrow::Cow;
use std::ops::DerefMut;

use pdf_writer::{Dict, Name};

/// A PDF stream filter.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum StreamFilter {
    Flate(u8),
}

impl StreamFilter {
    pub(crate) fn to_name(self) -> Name<'static> {
        match self {
            Self::Flate(_) => Name(b"FlateDecode"),
        }
    }

    pub(crate) fn apply(&self, content: &[u8]) -> Vec<u8> {
        match self {
            StreamFilter::Flate(level) => deflate_encode(content, *level),
        }
    }
}

pub(crate) struct FilterStreamBuilder<'a> {
    content: Cow<'a, [u8]>,
    filter: Option<StreamFilter>,
}

impl<'a> FilterStreamBuilder<'a> {
    /// Create a new stream, deflating the content if a compression level is given.
    pub(crate) fn new(content: &'a [u8], compression_level: Option<u8>) -> Self {
        let mut filter_stream = Self {
            content: Cow::Borrowed(content),
            filter: None,
        };

        if let Some(level) = compression_level {
            filter_stream.add_filter(StreamFilter::Flate(level));
        }

        filter_stream
    }

    pub(crate) fn finish(self) -> FilterStream<'a> {
        FilterStream {
            content: self.content,
            filter: self.filter,
        }
    }

    fn add_filter(&mut self, filter: StreamFilter) {
        self.content = Cow::Owned(filter.apply(&self.content));
        self.filter = Some(filter);
    }
}

pub(crate) struct FilterStream<'a> {
    content: Cow<'a, [u8]>,
    filter: Option<StreamFilter>,
}

impl FilterStream<'_> {
    pub(crate) fn encoded_data(&self) -> &[u8] {
        &self.content
    }

    pub(crate) fn write_filters<'b, T>(&self, mut dict: T)
    where
        T: DerefMut<Target = Dict<'b>>,
    {
        if let Some(filter) = self.filter {
            dict.deref_mut().pair(Name(b"Filter"), filter.to_name());
        }
    }
}

pub(crate) fn deflate_encode(data: &[u8], level: u8) -> Vec<u8> {
    miniz_oxide::deflate::compress_to_vec_zlib(data, level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncompressed_stream_is_borrowed() {
        let data = b"0 0 m 10 10 l S";
        let stream = FilterStreamBuilder::new(data, None).finish();
        assert_eq!(stream.encoded_data(), data);
        assert!(stream.filter.is_none());
    }

    #[test]
    fn deflated_stream_inflates_again() {
        let data = b"q 1 0 0 1 0 0 cm Q ".repeat(50);
        let stream = FilterStreamBuilder::new(&data, Some(6)).finish();
        assert!(stream.encoded_data().len() < data.len());

        let inflated =
            miniz_oxide::inflate::decompress_to_vec_zlib(stream.encoded_data()).unwrap();
        assert_eq!(inflated, data);
    }
}
