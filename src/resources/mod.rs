//! Declarative descriptions of the admin resources: which fields a form
//! shows, which columns a table lists, and which actions each offers.
//!
//! The admin frontend renders from these descriptors, and the server uses
//! them too: validation messages take their attribute names from field
//! labels, and list queries only honour columns marked sortable.

use serde::Serialize;
use serde_json::Value;

pub mod brands;
pub mod categories;
pub mod products;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Numeric,
    Markdown,
    Select,
    Toggle,
    Date,
    Image,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OptionItem {
    pub value: &'static str,
    pub label: &'static str,
}

/// `(relationship, title column)` for selects filled from another table.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Relationship {
    pub name: &'static str,
    pub title_attribute: &'static str,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
    pub label: Option<&'static str>,
    pub required: bool,
    pub disabled: bool,
    pub unique: bool,
    pub live_on_blur: bool,
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub regex: Option<&'static str>,
    pub default: Option<Value>,
    pub placeholder: Option<&'static str>,
    pub helper_text: Option<&'static str>,
    pub options: Vec<OptionItem>,
    pub relationship: Option<Relationship>,
    pub directory: Option<&'static str>,
    pub preserve_filenames: bool,
    pub column_span_full: bool,
}

impl Field {
    fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            label: None,
            required: false,
            disabled: false,
            unique: false,
            live_on_blur: false,
            min: None,
            max: None,
            regex: None,
            default: None,
            placeholder: None,
            helper_text: None,
            options: Vec::new(),
            relationship: None,
            directory: None,
            preserve_filenames: false,
            column_span_full: false,
        }
    }

    pub fn text(name: &'static str) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub fn numeric(name: &'static str) -> Self {
        Self::new(name, FieldKind::Numeric)
    }

    pub fn markdown(name: &'static str) -> Self {
        Self::new(name, FieldKind::Markdown)
    }

    pub fn select(name: &'static str) -> Self {
        Self::new(name, FieldKind::Select)
    }

    pub fn toggle(name: &'static str) -> Self {
        Self::new(name, FieldKind::Toggle)
    }

    pub fn date(name: &'static str) -> Self {
        Self::new(name, FieldKind::Date)
    }

    pub fn image(name: &'static str) -> Self {
        Self::new(name, FieldKind::Image)
    }

    pub fn label(mut self, label: &'static str) -> Self {
        self.label = Some(label);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn live_on_blur(mut self) -> Self {
        self.live_on_blur = true;
        self
    }

    pub fn min(mut self, min: i64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: i64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn regex(mut self, pattern: &'static str) -> Self {
        self.regex = Some(pattern);
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn placeholder(mut self, placeholder: &'static str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    pub fn helper_text(mut self, text: &'static str) -> Self {
        self.helper_text = Some(text);
        self
    }

    pub fn options(mut self, options: Vec<OptionItem>) -> Self {
        self.options = options;
        self
    }

    pub fn relationship(mut self, name: &'static str, title_attribute: &'static str) -> Self {
        self.relationship = Some(Relationship { name, title_attribute });
        self
    }

    pub fn directory(mut self, directory: &'static str) -> Self {
        self.directory = Some(directory);
        self
    }

    pub fn preserve_filenames(mut self) -> Self {
        self.preserve_filenames = true;
        self
    }

    pub fn column_span_full(mut self) -> Self {
        self.column_span_full = true;
        self
    }

    /// Name used in validation messages: the label when there is one,
    /// otherwise the field name with underscores as spaces.
    pub fn attribute(&self) -> String {
        match self.label {
            Some(label) => label.to_string(),
            None => self.name.replace('_', " "),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Tab {
    pub label: &'static str,
    pub columns: u8,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FormSchema {
    pub title: &'static str,
    pub tabs: Vec<Tab>,
}

impl FormSchema {
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.tabs.iter().flat_map(|tab| tab.fields.iter())
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields().find(|field| field.name == name)
    }

    pub fn attribute(&self, name: &str) -> String {
        self.field(name)
            .map(Field::attribute)
            .unwrap_or_else(|| name.replace('_', " "))
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Image,
    Text,
    Boolean,
    Date,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub label: Option<&'static str>,
    pub searchable: bool,
    pub sortable: bool,
    pub toggleable: bool,
}

impl Column {
    fn new(name: &'static str, kind: ColumnKind) -> Self {
        Self {
            name,
            kind,
            label: None,
            searchable: false,
            sortable: false,
            toggleable: false,
        }
    }

    pub fn text(name: &'static str) -> Self {
        Self::new(name, ColumnKind::Text)
    }

    pub fn image(name: &'static str) -> Self {
        Self::new(name, ColumnKind::Image)
    }

    pub fn boolean(name: &'static str) -> Self {
        Self::new(name, ColumnKind::Boolean)
    }

    pub fn date(name: &'static str) -> Self {
        Self::new(name, ColumnKind::Date)
    }

    pub fn label(mut self, label: &'static str) -> Self {
        self.label = Some(label);
        self
    }

    pub fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn toggleable(mut self) -> Self {
        self.toggleable = true;
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Create,
    Edit,
    View,
    Delete,
    Attach,
    Detach,
    DeleteBulk,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Action {
    pub kind: ActionKind,
    pub label: Option<&'static str>,
}

impl Action {
    pub fn new(kind: ActionKind) -> Self {
        Self { kind, label: None }
    }

    pub fn label(mut self, label: &'static str) -> Self {
        self.label = Some(label);
        self
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TableSchema {
    pub record_title_attribute: &'static str,
    pub columns: Vec<Column>,
    pub header_actions: Vec<Action>,
    /// Row actions, shown grouped behind one menu.
    pub row_actions: Vec<Action>,
    pub bulk_actions: Vec<Action>,
}

impl TableSchema {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn is_sortable(&self, name: &str) -> bool {
        self.column(name).is_some_and(|column| column.sortable)
    }

    pub fn searchable_columns(&self) -> Vec<&'static str> {
        self.columns
            .iter()
            .filter(|column| column.searchable)
            .map(|column| column.name)
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RelationManager {
    pub relationship: &'static str,
    pub form: FormSchema,
    pub table: TableSchema,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Resource {
    pub slug: &'static str,
    pub label: &'static str,
    pub plural_label: &'static str,
    pub navigation_icon: &'static str,
    pub navigation_sort: u8,
    pub form: FormSchema,
    pub table: TableSchema,
    pub relation_managers: Vec<RelationManager>,
}

/// Every resource the panel serves, in navigation order.
pub fn registry() -> Vec<Resource> {
    let mut resources = vec![products::resource(), categories::resource(), brands::resource()];
    resources.sort_by_key(|resource| resource.navigation_sort);
    resources
}

pub fn find(slug: &str) -> Option<Resource> {
    registry().into_iter().find(|resource| resource.slug == slug)
}
