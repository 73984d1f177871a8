//! The resources of a page.
//!
//! Every page has its own resource dictionary. Objects are registered with the
//! [`ResourceDictionaryBuilder`] of the page when they are first used on it and get
//! a name made of a prefix and a running number, for example `/x0` for the first
//! image. Registering the same object again returns the same name.

use std::collections::HashMap;
use std::marker::PhantomData;

use pdf_writer::types::ProcSet;
use pdf_writer::writers::{Page, Resources};
use pdf_writer::{Dict, Finish, Ref};

use crate::util::NameExt;

/// A category of the resource dictionary.
pub(crate) trait ResourceKind: Sized {
    const PREFIX: &'static str;

    fn dict<'a>(resources: &'a mut Resources) -> Dict<'a>;
    fn names(builder: &mut ResourceDictionaryBuilder) -> &mut ResourceNames<Self>;
}

/// Opacity graphics states.
#[derive(Debug)]
pub(crate) struct ExtGState;
/// Images.
#[derive(Debug)]
pub(crate) struct XObject;
/// Tiling patterns of stipples.
#[derive(Debug)]
pub(crate) struct Pattern;
#[derive(Debug)]
pub(crate) struct Font;

macro_rules! resource_kind {
    ($kind:ident, $prefix:literal, $dict:ident, $field:ident) => {
        impl ResourceKind for $kind {
            const PREFIX: &'static str = $prefix;

            fn dict<'a>(resources: &'a mut Resources) -> Dict<'a> {
                resources.$dict()
            }

            fn names(builder: &mut ResourceDictionaryBuilder) -> &mut ResourceNames<Self> {
                &mut builder.$field
            }
        }
    };
}

resource_kind!(ExtGState, "g", ext_g_states, ext_g_states);
resource_kind!(XObject, "x", x_objects, x_objects);
resource_kind!(Pattern, "p", patterns, patterns);
resource_kind!(Font, "f", fonts, fonts);

/// The objects of one category, in the order they were registered.
#[derive(Debug)]
pub(crate) struct ResourceNames<K> {
    refs: Vec<Ref>,
    numbers: HashMap<Ref, usize>,
    kind: PhantomData<K>,
}

impl<K> Default for ResourceNames<K> {
    fn default() -> Self {
        Self {
            refs: vec![],
            numbers: HashMap::new(),
            kind: PhantomData,
        }
    }
}

impl<K: ResourceKind> ResourceNames<K> {
    fn name(number: usize) -> String {
        format!("{}{number}", K::PREFIX)
    }

    fn register(&mut self, object: Ref) -> String {
        let refs = &mut self.refs;
        let number = *self.numbers.entry(object).or_insert_with(|| {
            refs.push(object);
            refs.len() - 1
        });

        Self::name(number)
    }

    fn entries(&self) -> impl Iterator<Item = (String, Ref)> + '_ {
        self.refs
            .iter()
            .enumerate()
            .map(|(number, object)| (Self::name(number), *object))
    }

    fn write(&self, resources: &mut Resources) {
        if self.refs.is_empty() {
            return;
        }

        let mut dict = K::dict(resources);

        for (name, object) in self.entries() {
            dict.pair(name.to_pdf_name(), object);
        }

        dict.finish();
    }
}

#[derive(Debug, Default)]
pub(crate) struct ResourceDictionaryBuilder {
    ext_g_states: ResourceNames<ExtGState>,
    patterns: ResourceNames<Pattern>,
    x_objects: ResourceNames<XObject>,
    fonts: ResourceNames<Font>,
}

impl ResourceDictionaryBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register an object and return its name in the dictionary.
    pub(crate) fn register_resource<K: ResourceKind>(&mut self, object: Ref) -> String {
        K::names(self).register(object)
    }

    pub(crate) fn finish(self) -> ResourceDictionary {
        ResourceDictionary { names: self }
    }
}

/// The complete resource dictionary of a page.
#[derive(Debug, Default)]
pub(crate) struct ResourceDictionary {
    names: ResourceDictionaryBuilder,
}

impl ResourceDictionary {
    pub(crate) fn to_pdf_resources(&self, page: &mut Page) {
        let resources = &mut page.resources();
        resources.proc_sets([
            ProcSet::Pdf,
            ProcSet::Text,
            ProcSet::ImageColor,
            ProcSet::ImageGrayscale,
        ]);

        self.names.ext_g_states.write(resources);
        self.names.patterns.write(resources);
        self.names.x_objects.write(resources);
        self.names.fonts.write(resources);
    }

    /// The number of objects of a category.
    #[cfg(test)]
    pub(crate) fn len<K: ResourceKind>(&mut self) -> usize {
        K::names(&mut self.names).refs.len()
    }
}
