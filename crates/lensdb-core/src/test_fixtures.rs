//! Shared test metadata: a small commerce domain with a reference chain
//! (customer → employee → address), a mutual cycle (customer ↔ order), and a
//! self-referential entity (category → category).

use crate::model::{EntityModel, MetadataCatalog, PropertyModel};

pub(crate) fn test_catalog() -> MetadataCatalog {
    let mut catalog = MetadataCatalog::new();

    catalog
        .register(
            EntityModel::new("customer")
                .with_property(PropertyModel::system("id"))
                .with_property(PropertyModel::system("version"))
                .with_property(PropertyModel::system("deleted_at"))
                .with_property(PropertyModel::scalar("name"))
                .with_property(PropertyModel::scalar("email"))
                .with_property(PropertyModel::scalar("status"))
                .with_property(PropertyModel::reference("owner", "employee"))
                .with_property(PropertyModel::collection("orders", "order"))
                .with_display("name"),
        )
        .expect("customer should register");

    catalog
        .register(
            EntityModel::new("employee")
                .with_property(PropertyModel::system("id"))
                .with_property(PropertyModel::system("version"))
                .with_property(PropertyModel::scalar("name"))
                .with_property(PropertyModel::scalar("phone"))
                .with_property(PropertyModel::reference("address", "address"))
                .with_display("name"),
        )
        .expect("employee should register");

    catalog
        .register(
            EntityModel::new("address")
                .with_property(PropertyModel::system("id"))
                .with_property(PropertyModel::scalar("city"))
                .with_property(PropertyModel::scalar("street"))
                .with_property(PropertyModel::scalar("zip")),
        )
        .expect("address should register");

    catalog
        .register(
            EntityModel::new("order")
                .with_property(PropertyModel::system("id"))
                .with_property(PropertyModel::system("version"))
                .with_property(PropertyModel::scalar("number"))
                .with_property(PropertyModel::scalar("total"))
                .with_property(PropertyModel::reference("customer", "customer"))
                .with_display("number"),
        )
        .expect("order should register");

    catalog
        .register(
            EntityModel::new("category")
                .with_property(PropertyModel::system("id"))
                .with_property(PropertyModel::system("version"))
                .with_property(PropertyModel::scalar("name"))
                .with_property(PropertyModel::reference("parent", "category"))
                .with_display("name"),
        )
        .expect("category should register");

    catalog
}
