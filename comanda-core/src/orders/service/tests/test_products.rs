use super::*;

#[tokio::test]
async fn adding_the_same_menu_product_twice_merges() {
    let (mut service, _db) = create_test_service().await;
    order_with_dish(&mut service);

    service.add_product(&taco()).unwrap();
    service.add_product(&taco()).unwrap();

    let dish = service.active_dish().unwrap();
    assert_eq!(dish.products.len(), 1);
    assert_eq!(dish.products[0].quantity, 2);
    assert_eq!(dish.total_amount, 60.0);
    assert_eq!(service.active_order().unwrap().total_amount, 60.0);
}

#[tokio::test]
async fn custom_products_insert_separately_even_with_equal_labels() {
    let (mut service, _db) = create_test_service().await;
    order_with_dish(&mut service);

    let first_key = service.next_custom_product_key();
    let second_key = service.next_custom_product_key();
    service
        .add_product(&ProductDraft::custom(&first_key, "Especial", 10.0))
        .unwrap();
    service
        .add_product(&ProductDraft::custom(&second_key, "Especial", 10.0))
        .unwrap();

    let dish = service.active_dish().unwrap();
    assert_eq!(dish.products.len(), 2);
    assert_eq!(dish.products[0].display_name, "Especial");
    assert_eq!(service.active_order().unwrap().total_amount, 20.0);
}

#[tokio::test]
async fn product_mutations_keep_totals_in_sync() {
    let (mut service, _db) = create_test_service().await;
    order_with_dish(&mut service);
    service.add_product(&taco()).unwrap();
    service
        .add_product(&ProductDraft::menu("Nachos", 45.0))
        .unwrap();

    service.set_product_quantity("Taco", 3).unwrap();
    assert_eq!(service.active_order().unwrap().total_amount, 135.0);

    service.set_product_quantity("Taco", 0).unwrap();
    assert_eq!(service.active_dish().unwrap().products[0].quantity, 1);
    assert_eq!(service.active_order().unwrap().total_amount, 75.0);

    service.set_product_price("Nachos", 40.0).unwrap();
    assert_eq!(service.active_order().unwrap().total_amount, 70.0);

    service.remove_product("Nachos").unwrap();
    assert_eq!(service.active_order().unwrap().total_amount, 30.0);

    let err = service.remove_product("Nachos").unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn negative_or_non_finite_prices_are_rejected() {
    let (mut service, _db) = create_test_service().await;
    order_with_dish(&mut service);
    service.add_product(&taco()).unwrap();

    for bad in [-1.0, f64::NAN, f64::INFINITY] {
        let err = service.set_product_price("Taco", bad).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
    // Rejected operations leave the aggregate untouched
    assert_eq!(service.active_order().unwrap().total_amount, 30.0);
}

#[tokio::test]
async fn rename_changes_identity_for_menu_and_label_for_custom() {
    let (mut service, _db) = create_test_service().await;
    order_with_dish(&mut service);
    service.add_product(&taco()).unwrap();
    service
        .add_product(&ProductDraft::menu("Nachos", 45.0))
        .unwrap();
    let key = service.next_custom_product_key();
    service
        .add_product(&ProductDraft::custom(&key, "Especial", 10.0))
        .unwrap();

    // Menu rename collides with an existing product
    let err = service.rename_product("Taco", "Nachos").unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    service.rename_product("Taco", "Taco al pastor").unwrap();
    let dish = service.active_dish().unwrap();
    assert!(dish.product("Taco al pastor").is_some());
    assert!(dish.product("Taco").is_none());

    // Custom rename keeps the generated key, changes the label
    service.rename_product(&key, "Aún más especial").unwrap();
    let dish = service.active_dish().unwrap();
    let custom = dish.product(&key).unwrap();
    assert_eq!(custom.display_name, "Aún más especial");

    let err = service.rename_product("Quesadilla", "X").unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn product_operations_require_an_active_dish() {
    let (mut service, _db) = create_test_service().await;
    service.create_order();

    let err = service.add_product(&taco()).unwrap_err();
    assert!(matches!(err, AppError::BusinessRule(_)));
    let err = service.set_product_quantity("Taco", 2).unwrap_err();
    assert!(matches!(err, AppError::BusinessRule(_)));
}
