//! Composite filters built from child filters
//!
//! - `AllOfFilter`: accepts when every child accepts (empty accepts all)
//! - `AnyOfFilter`: accepts when some child accepts (empty rejects all)
//! - `NotFilter`: inverts its single child
//!
//! Children are evaluated in order with short-circuiting, so stateful
//! children only observe the annotations that reach them.

use annostore_core::{Annotation, AnnotationFilter, Coordinate};

fn fresh_all<T: Coordinate>(children: &[Box<dyn AnnotationFilter<T>>]) -> Vec<Box<dyn AnnotationFilter<T>>> {
    children.iter().map(|c| c.fresh()).collect()
}

/// Conjunction of child filters
#[derive(Debug)]
pub struct AllOfFilter<T: Coordinate> {
    children: Vec<Box<dyn AnnotationFilter<T>>>,
}

impl<T: Coordinate> AllOfFilter<T> {
    /// Registered type name
    pub const TYPE_NAME: &'static str = "all";

    /// Conjunction of `children`, evaluated in order
    pub fn new(children: Vec<Box<dyn AnnotationFilter<T>>>) -> Self {
        Self { children }
    }
}

impl<T: Coordinate> AnnotationFilter<T> for AllOfFilter<T> {
    fn name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn accepts(&mut self, annotation: &Annotation<T>) -> bool {
        self.children.iter_mut().all(|c| c.accepts(annotation))
    }

    fn fresh(&self) -> Box<dyn AnnotationFilter<T>> {
        Box::new(AllOfFilter::new(fresh_all(&self.children)))
    }
}

/// Disjunction of child filters
#[derive(Debug)]
pub struct AnyOfFilter<T: Coordinate> {
    children: Vec<Box<dyn AnnotationFilter<T>>>,
}

impl<T: Coordinate> AnyOfFilter<T> {
    /// Registered type name
    pub const TYPE_NAME: &'static str = "any";

    /// Disjunction of `children`, evaluated in order
    pub fn new(children: Vec<Box<dyn AnnotationFilter<T>>>) -> Self {
        Self { children }
    }
}

impl<T: Coordinate> AnnotationFilter<T> for AnyOfFilter<T> {
    fn name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn accepts(&mut self, annotation: &Annotation<T>) -> bool {
        self.children.iter_mut().any(|c| c.accepts(annotation))
    }

    fn fresh(&self) -> Box<dyn AnnotationFilter<T>> {
        Box::new(AnyOfFilter::new(fresh_all(&self.children)))
    }
}

/// Negation of one child filter
#[derive(Debug)]
pub struct NotFilter<T: Coordinate> {
    inner: Box<dyn AnnotationFilter<T>>,
}

impl<T: Coordinate> NotFilter<T> {
    /// Registered type name
    pub const TYPE_NAME: &'static str = "not";

    /// Negate `inner`
    pub fn new(inner: Box<dyn AnnotationFilter<T>>) -> Self {
        Self { inner }
    }
}

impl<T: Coordinate> AnnotationFilter<T> for NotFilter<T> {
    fn name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn accepts(&mut self, annotation: &Annotation<T>) -> bool {
        !self.inner.accepts(annotation)
    }

    fn fresh(&self) -> Box<dyn AnnotationFilter<T>> {
        Box::new(NotFilter::new(self.inner.fresh()))
    }
}
