use serde_json::json;

use super::{Action, ActionKind, Column, Field, FormSchema, Resource, Tab, TableSchema};

pub fn form() -> FormSchema {
    FormSchema {
        title: "Marques",
        tabs: vec![Tab {
            label: "Informations",
            columns: 2,
            fields: vec![
                Field::text("name").label("Nom").required().live_on_blur().unique(),
                Field::text("slug").required().disabled().unique(),
                Field::text("url").label("Site web"),
                Field::toggle("is_visible").label("Visibilité").default_value(json!(true)),
                Field::markdown("description").column_span_full(),
            ],
        }],
    }
}

pub fn table() -> TableSchema {
    TableSchema {
        record_title_attribute: "name",
        columns: vec![
            Column::text("name").label("Nom").searchable().sortable(),
            Column::text("url").label("Site web").toggleable(),
            Column::boolean("is_visible").toggleable(),
            Column::date("updated_at").sortable().toggleable(),
        ],
        header_actions: vec![Action::new(ActionKind::Create)],
        row_actions: vec![
            Action::new(ActionKind::Edit),
            Action::new(ActionKind::View),
            Action::new(ActionKind::Delete),
        ],
        bulk_actions: Vec::new(),
    }
}

pub fn resource() -> Resource {
    Resource {
        slug: "brands",
        label: "Marque",
        plural_label: "Marques",
        navigation_icon: "heroicon-o-tag",
        navigation_sort: 2,
        form: form(),
        table: table(),
        relation_managers: Vec::new(),
    }
}
