//! Page schemas - explicit name to member registration
//!
//! A concrete page lists its element slots and actions once, in
//! `PageObject::define`. The resulting `PageSchema` is built the first time
//! the page type is used and cached for the rest of the process. Lookups by
//! name then go through typed accessor closures instead of runtime
//! introspection.

use futures::future::BoxFuture;
use serde_json::Value;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, OnceLock};
use tracing::debug;

use super::error::{PageError, SchemaError};
use super::{PageObject, Transition};
use crate::browser::{CollectionRef, ElementRef};

/// What kind of member a slot holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    /// A single element
    Element,
    /// A single element tagged as test-input data
    Input,
    /// A lazily located element list
    Collection,
}

impl SlotKind {
    pub fn is_input(&self) -> bool {
        matches!(self, SlotKind::Input)
    }
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SlotKind::Element => "element",
            SlotKind::Input => "input",
            SlotKind::Collection => "collection",
        };
        f.write_str(name)
    }
}

/// Read access to a resolved slot
pub enum SlotRef<'a> {
    Element(&'a ElementRef),
    Collection(&'a CollectionRef),
}

/// Write access to a resolved slot
pub enum SlotMut<'a> {
    Element(&'a mut ElementRef),
    Collection(&'a mut CollectionRef),
}

/// Owned copy of a slot's current reference
#[derive(Clone)]
pub enum FieldValue {
    Element(ElementRef),
    Collection(CollectionRef),
}

impl FieldValue {
    pub fn as_element(&self) -> Option<&ElementRef> {
        match self {
            FieldValue::Element(e) => Some(e),
            FieldValue::Collection(_) => None,
        }
    }

    pub fn as_collection(&self) -> Option<&CollectionRef> {
        match self {
            FieldValue::Collection(c) => Some(c),
            FieldValue::Element(_) => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            FieldValue::Element(e) => e.describe(),
            FieldValue::Collection(c) => c.describe(),
        }
    }
}

impl fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Element(e) => f.debug_tuple("Element").field(&e.describe()).finish(),
            FieldValue::Collection(c) => f.debug_tuple("Collection").field(&c.describe()).finish(),
        }
    }
}

impl From<SlotRef<'_>> for FieldValue {
    fn from(slot: SlotRef<'_>) -> Self {
        match slot {
            SlotRef::Element(e) => FieldValue::Element(e.clone()),
            SlotRef::Collection(c) => FieldValue::Collection(c.clone()),
        }
    }
}

/// Future returned by an action invoker
pub type ActionFuture<'a> = BoxFuture<'a, anyhow::Result<Transition>>;

type Reader<P> = Box<dyn for<'a> Fn(&'a P) -> SlotRef<'a> + Send + Sync>;
type Writer<P> = Box<dyn for<'a> Fn(&'a mut P) -> SlotMut<'a> + Send + Sync>;
type Invoker<P> = Box<dyn for<'a> Fn(&'a mut P, Vec<Value>) -> ActionFuture<'a> + Send + Sync>;

// Pin the higher-ranked signatures so the wrapping closures below infer them.
fn reader<P, F>(f: F) -> F
where
    F: for<'a> Fn(&'a P) -> SlotRef<'a>,
{
    f
}

fn writer<P, F>(f: F) -> F
where
    F: for<'a> Fn(&'a mut P) -> SlotMut<'a>,
{
    f
}

/// A named element slot
pub struct FieldSlot<P> {
    name: String,
    kind: SlotKind,
    read: Reader<P>,
    write: Writer<P>,
}

impl<P> FieldSlot<P> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SlotKind {
        self.kind
    }

    pub fn read<'a>(&self, page: &'a P) -> SlotRef<'a> {
        (self.read)(page)
    }

    pub fn write<'a>(&self, page: &'a mut P) -> SlotMut<'a> {
        (self.write)(page)
    }
}

/// A named action with a fixed parameter count
pub struct ActionSlot<P> {
    name: String,
    arity: usize,
    invoke: Invoker<P>,
}

impl<P> ActionSlot<P> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn invoke<'a>(&self, page: &'a mut P, params: Vec<Value>) -> ActionFuture<'a> {
        (self.invoke)(page, params)
    }
}

/// Builder collecting a page type's slots and actions
pub struct SchemaBuilder<P> {
    fields: Vec<FieldSlot<P>>,
    actions: Vec<ActionSlot<P>>,
}

impl<P: 'static> Default for SchemaBuilder<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: 'static> SchemaBuilder<P> {
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            actions: Vec::new(),
        }
    }

    fn slot<G, M>(mut self, name: &str, kind: SlotKind, get: G, get_mut: M) -> Self
    where
        G: Fn(&P) -> &ElementRef + Send + Sync + 'static,
        M: Fn(&mut P) -> &mut ElementRef + Send + Sync + 'static,
    {
        self.fields.push(FieldSlot {
            name: name.to_string(),
            kind,
            read: Box::new(reader::<P, _>(move |p| SlotRef::Element(get(p)))),
            write: Box::new(writer::<P, _>(move |p| SlotMut::Element(get_mut(p)))),
        });
        self
    }

    /// Register an element slot
    #[must_use]
    pub fn element<G, M>(self, name: &str, get: G, get_mut: M) -> Self
    where
        G: Fn(&P) -> &ElementRef + Send + Sync + 'static,
        M: Fn(&mut P) -> &mut ElementRef + Send + Sync + 'static,
    {
        self.slot(name, SlotKind::Element, get, get_mut)
    }

    /// Register an element slot that receives generated default data
    #[must_use]
    pub fn input<G, M>(self, name: &str, get: G, get_mut: M) -> Self
    where
        G: Fn(&P) -> &ElementRef + Send + Sync + 'static,
        M: Fn(&mut P) -> &mut ElementRef + Send + Sync + 'static,
    {
        self.slot(name, SlotKind::Input, get, get_mut)
    }

    /// Register an element-list slot
    #[must_use]
    pub fn collection<G, M>(mut self, name: &str, get: G, get_mut: M) -> Self
    where
        G: Fn(&P) -> &CollectionRef + Send + Sync + 'static,
        M: Fn(&mut P) -> &mut CollectionRef + Send + Sync + 'static,
    {
        self.fields.push(FieldSlot {
            name: name.to_string(),
            kind: SlotKind::Collection,
            read: Box::new(reader::<P, _>(move |p| SlotRef::Collection(get(p)))),
            write: Box::new(writer::<P, _>(move |p| SlotMut::Collection(get_mut(p)))),
        });
        self
    }

    /// Register an action taking exactly `arity` parameters
    #[must_use]
    pub fn action<F>(mut self, name: &str, arity: usize, invoke: F) -> Self
    where
        F: for<'a> Fn(&'a mut P, Vec<Value>) -> ActionFuture<'a> + Send + Sync + 'static,
    {
        self.actions.push(ActionSlot {
            name: name.to_string(),
            arity,
            invoke: Box::new(invoke),
        });
        self
    }

    /// Validate the registrations and produce the schema
    pub fn build(self) -> Result<PageSchema<P>, SchemaError> {
        let page = std::any::type_name::<P>().to_string();

        let mut index = HashMap::new();
        for (position, field) in self.fields.iter().enumerate() {
            if field.name.is_empty() {
                return Err(SchemaError::EmptyName { page });
            }
            if index.insert(field.name.clone(), position).is_some() {
                return Err(SchemaError::DuplicateField {
                    page,
                    field: field.name.clone(),
                });
            }
        }

        let mut signatures = HashMap::new();
        for (position, action) in self.actions.iter().enumerate() {
            if action.name.is_empty() {
                return Err(SchemaError::EmptyName { page });
            }
            if signatures
                .insert((action.name.clone(), action.arity), position)
                .is_some()
            {
                return Err(SchemaError::DuplicateAction {
                    page,
                    action: action.name.clone(),
                    arity: action.arity,
                });
            }
        }

        Ok(PageSchema {
            fields: self.fields,
            actions: self.actions,
            index,
            signatures,
        })
    }
}

/// Validated slots and actions of one page type
pub struct PageSchema<P> {
    fields: Vec<FieldSlot<P>>,
    actions: Vec<ActionSlot<P>>,
    index: HashMap<String, usize>,
    signatures: HashMap<(String, usize), usize>,
}

impl<P> PageSchema<P> {
    /// Slot named exactly `name`
    pub fn field(&self, name: &str) -> Option<&FieldSlot<P>> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    /// Slots in declaration order
    pub fn fields(&self) -> impl Iterator<Item = &FieldSlot<P>> {
        self.fields.iter()
    }

    /// Slots tagged as test-input data, in declaration order
    pub fn input_fields(&self) -> impl Iterator<Item = &FieldSlot<P>> {
        self.fields.iter().filter(|f| f.kind.is_input())
    }

    /// Action matching both name and parameter count
    pub fn action(&self, name: &str, arity: usize) -> Option<&ActionSlot<P>> {
        self.signatures
            .get(&(name.to_string(), arity))
            .map(|&i| &self.actions[i])
    }

    /// `(name, arity)` of every action, in declaration order
    pub fn action_signatures(&self) -> Vec<(String, usize)> {
        self.actions
            .iter()
            .map(|a| (a.name.clone(), a.arity))
            .collect()
    }
}

impl<P: PageObject> PageSchema<P> {
    /// Resolve `field` on `page` for reading
    pub fn resolve<'p>(&self, page: &'p P, field: &str) -> Result<SlotRef<'p>, PageError> {
        debug!(page = page.name(), field, "resolving field");
        self.field(field)
            .map(|slot| slot.read(page))
            .ok_or_else(|| PageError::FieldNotFound {
                page: page.name().to_string(),
                field: field.to_string(),
            })
    }

    /// Resolve `field` on `page` for overwriting
    pub fn resolve_mut<'p>(&self, page: &'p mut P, field: &str) -> Result<SlotMut<'p>, PageError> {
        match self.field(field) {
            Some(slot) => Ok(slot.write(page)),
            None => Err(PageError::FieldNotFound {
                page: page.name().to_string(),
                field: field.to_string(),
            }),
        }
    }
}

type SchemaCache = Mutex<HashMap<TypeId, &'static (dyn Any + Send + Sync)>>;

static SCHEMAS: OnceLock<SchemaCache> = OnceLock::new();

fn cached<P: PageObject>() -> Option<&'static PageSchema<P>> {
    let cache = SCHEMAS.get_or_init(Default::default);
    let guard = cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    guard
        .get(&TypeId::of::<P>())
        .copied()
        .and_then(|schema| schema.downcast_ref::<PageSchema<P>>())
}

/// The schema of page type `P`, built on first use and cached afterwards
pub fn schema_of<P: PageObject>() -> Result<&'static PageSchema<P>, SchemaError> {
    if let Some(schema) = cached::<P>() {
        return Ok(schema);
    }

    let built = P::define(SchemaBuilder::new()).build()?;
    debug!(
        page = std::any::type_name::<P>(),
        fields = built.fields.len(),
        actions = built.actions.len(),
        "page schema built"
    );

    let cache = SCHEMAS.get_or_init(Default::default);
    let mut guard = cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let entry = match guard.get(&TypeId::of::<P>()) {
        Some(existing) => *existing,
        None => {
            let leaked: &'static (dyn Any + Send + Sync) = Box::leak(Box::new(built));
            guard.insert(TypeId::of::<P>(), leaked);
            leaked
        }
    };
    drop(guard);

    Ok(entry
        .downcast_ref::<PageSchema<P>>()
        .expect("schema cache entries are keyed by their own TypeId"))
}
