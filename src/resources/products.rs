use serde_json::json;

use super::{Action, ActionKind, Column, Field, FormSchema, OptionItem, RelationManager, Resource, Tab, TableSchema};
use crate::db::ProductType;

/// At most six integer digits and two decimals, matching `NUMERIC(8, 2)`.
pub const PRICE_PATTERN: &str = r"^\d{1,6}(\.\d{0,2})?$";
pub const PRICE_MIN: i64 = 1;
pub const QUANTITY_MIN: i64 = 0;
pub const QUANTITY_MAX: i64 = 100;
pub const IMAGE_DIRECTORY: &str = "form-attachments";

pub fn form() -> FormSchema {
    FormSchema {
        title: "Produits",
        tabs: vec![
            Tab {
                label: "Informations",
                columns: 2,
                fields: vec![
                    Field::text("name").required().live_on_blur().unique(),
                    Field::text("slug").required().disabled().unique(),
                    Field::markdown("description").column_span_full(),
                ],
            },
            Tab {
                label: "Prix et inventaire",
                columns: 2,
                fields: vec![
                    Field::text("sku")
                        .label("SKU (Unité de gestion des stocks)")
                        .unique()
                        .required(),
                    Field::numeric("price")
                        .min(PRICE_MIN)
                        .label("Prix")
                        .regex(PRICE_PATTERN)
                        .required(),
                    Field::numeric("quantity")
                        .label("Quantité")
                        .min(QUANTITY_MIN)
                        .max(QUANTITY_MAX)
                        .required(),
                    Field::select("type")
                        .placeholder("Choisir un type")
                        .options(
                            ProductType::ALL
                                .iter()
                                .map(|kind| OptionItem {
                                    value: kind.as_str(),
                                    label: kind.as_str(),
                                })
                                .collect(),
                        ),
                ],
            },
            Tab {
                label: "Autres infos",
                columns: 2,
                fields: vec![
                    Field::toggle("is_visible")
                        .label("Visibilité")
                        .helper_text("Si cette option est désactivée, le produit ne sera pas visible sur la page d'accueil.")
                        .default_value(json!(true))
                        .required(),
                    Field::toggle("is_featured")
                        .label("En Vedette")
                        .helper_text("Une fois qu'un produit est en vedette, il apparait dans la section \"Nouveautés\" sur le site. Il est possible qu'il soit affiché avant les produits classiques."),
                    Field::date("published_at")
                        .label("Date de Publication")
                        .default_value(json!("today")),
                    Field::select("brand_id")
                        .placeholder("Selectionner une marque")
                        .label("Marque")
                        .required()
                        .relationship("brand", "name"),
                    Field::image("image")
                        .directory(IMAGE_DIRECTORY)
                        .preserve_filenames()
                        .label("Image du produit")
                        .column_span_full(),
                ],
            },
        ],
    }
}

pub fn table() -> TableSchema {
    TableSchema {
        record_title_attribute: "name",
        columns: vec![
            Column::image("image").toggleable(),
            Column::text("name").label("Nom").searchable().sortable().toggleable(),
            Column::text("brand.name").searchable().sortable().toggleable(),
            Column::boolean("is_visible").toggleable(),
            Column::text("price").searchable().sortable().toggleable(),
            Column::text("quantity").searchable().sortable().toggleable(),
            Column::date("published_at").sortable().toggleable(),
            Column::text("type"),
        ],
        header_actions: vec![Action::new(ActionKind::Create).label("Ajouter un produit")],
        row_actions: vec![
            Action::new(ActionKind::Edit).label("Modifier"),
            Action::new(ActionKind::View).label("Voir"),
            Action::new(ActionKind::Delete).label("Supprimer"),
        ],
        bulk_actions: vec![Action::new(ActionKind::DeleteBulk)],
    }
}

/// The products relation as managed from a category page, which can also
/// attach existing products and detach them without deleting.
pub fn relation_manager() -> RelationManager {
    let mut table = table();
    table.header_actions.push(Action::new(ActionKind::Attach));
    table.row_actions.insert(2, Action::new(ActionKind::Detach));
    RelationManager {
        relationship: "products",
        form: form(),
        table,
    }
}

pub fn resource() -> Resource {
    Resource {
        slug: "products",
        label: "Produit",
        plural_label: "Produits",
        navigation_icon: "heroicon-o-shopping-bag",
        navigation_sort: 0,
        form: form(),
        table: table(),
        relation_managers: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_has_three_tabs() {
        let labels: Vec<&str> = form().tabs.iter().map(|tab| tab.label).collect();
        assert_eq!(labels, vec!["Informations", "Prix et inventaire", "Autres infos"]);
    }

    #[test]
    fn slug_is_disabled_and_unique() {
        let form = form();
        let slug = form.field("slug").unwrap();
        assert!(slug.disabled);
        assert!(slug.unique);
        assert!(slug.required);
    }

    #[test]
    fn price_and_quantity_carry_their_bounds() {
        let form = form();
        let price = form.field("price").unwrap();
        assert_eq!(price.regex, Some(PRICE_PATTERN));
        assert_eq!(price.min, Some(1));
        let quantity = form.field("quantity").unwrap();
        assert_eq!((quantity.min, quantity.max), (Some(0), Some(100)));
    }

    #[test]
    fn table_sortable_columns() {
        let table = table();
        for column in ["name", "brand.name", "price", "quantity", "published_at"] {
            assert!(table.is_sortable(column), "{column} should be sortable");
        }
        assert!(!table.is_sortable("type"));
        assert!(!table.is_sortable("image"));
        assert_eq!(table.searchable_columns(), vec!["name", "brand.name", "price", "quantity"]);
    }

    #[test]
    fn relation_manager_adds_attach_and_detach() {
        let manager = relation_manager();
        assert!(manager.table.header_actions.iter().any(|a| a.kind == ActionKind::Attach));
        assert!(manager.table.row_actions.iter().any(|a| a.kind == ActionKind::Detach));
    }
}
