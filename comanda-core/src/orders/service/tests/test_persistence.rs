use super::*;

#[tokio::test]
async fn persist_then_reload_reproduces_the_graph() {
    let (mut service, db) = create_test_service().await;
    let (order_id, _dish_id) = order_with_dish(&mut service);
    service.add_product(&taco()).unwrap();
    service.add_product(&taco()).unwrap();
    service.add_dish().unwrap();
    service
        .add_product(&ProductDraft::menu("Nachos", 45.0))
        .unwrap();
    service
        .register_order_form(&OrderForm {
            name: "Mesa ventana".into(),
            table: "Table 2".into(),
            amount_paid: 100.0,
            ..Default::default()
        })
        .unwrap();
    service.persist_active().await.unwrap();
    assert!(!service.has_unsaved_edits());

    // Fresh service over the same store: the session working set is gone
    let mut restarted = OrderService::new(&db, TEST_TZ).await;
    assert_eq!(restarted.load_open_orders().await.unwrap(), 1);
    restarted.select_order(&order_id).unwrap();

    let order = restarted.active_order().unwrap();
    assert_eq!(order.name, "Mesa ventana");
    assert_eq!(order.table, "Table 2");
    assert_eq!(order.amount_paid, 100.0);
    assert_eq!(order.dishes.len(), 2);
    assert_eq!(order.dishes[0].products[0].quantity, 2);
    assert_eq!(order.dishes[1].products[0].name, "Nachos");
    assert_eq!(order.total_amount, 105.0);
    assert_eq!(
        order.active_dish_id.as_deref(),
        Some(order.dishes[0].id.as_str())
    );
}

#[tokio::test]
async fn send_persists_immediately_and_counts_once() {
    let (mut service, db) = create_test_service().await;
    let (order_id, dish_id) = order_with_dish(&mut service);
    service.add_product(&taco()).unwrap();

    service.send_dish(&dish_id).await.unwrap();
    service.send_dish(&dish_id).await.unwrap();

    let order = service.active_order().unwrap();
    assert_eq!(order.dishes[0].sent_count, 1);
    assert_eq!(order.dishes[0].status, DishStatus::Sent);
    assert!(order.sent_status);

    // Already on disk without an explicit persist call
    let stored = crate::db::repository::order::load_order(&db.pool, &order_id)
        .await
        .unwrap();
    assert_eq!(stored.dishes[0].sent_count, 1);
    assert!(stored.sent_status);
}

#[tokio::test]
async fn send_all_dishes_updates_the_aggregate_flag() {
    let (mut service, _db) = create_test_service().await;
    service.create_order();
    service.add_dish().unwrap();
    service.add_dish().unwrap();
    service.add_product(&taco()).unwrap();

    service.send_all_dishes().await.unwrap();
    let order = service.active_order().unwrap();
    assert!(order.sent_status);
    assert!(order.dishes.iter().all(|d| d.sent_count == 1));

    // The flag refreshes on send and removal, not on add
    let extra = service.add_dish().unwrap();
    assert!(service.active_order().unwrap().sent_status);

    let first_sent = service.active_order().unwrap().dishes[0].id.clone();
    service.remove_dish(&first_sent).unwrap();
    assert!(!service.active_order().unwrap().sent_status);

    service.remove_dish(&extra).unwrap();
    assert!(service.active_order().unwrap().sent_status);
}

#[tokio::test]
async fn close_stamps_closed_at_once_across_reopen_cycles() {
    let (mut service, _db) = create_test_service().await;
    let (_order_id, _dish_id) = order_with_dish(&mut service);
    service.add_product(&taco()).unwrap();

    service.close_order().await.unwrap();
    let first_close = service.active_order().unwrap().closed_at.unwrap();

    // Saving the reopened order does not clear the first-close stamp
    service.reopen_order().unwrap();
    service.persist_active().await.unwrap();
    assert_eq!(
        service.active_order().unwrap().closed_at,
        Some(first_close)
    );

    service.add_product(&taco()).unwrap();
    service.close_order().await.unwrap();
    assert_eq!(
        service.active_order().unwrap().closed_at,
        Some(first_close)
    );
}

#[tokio::test]
async fn closed_orders_drop_out_of_the_open_set() {
    let (mut service, _db) = create_test_service().await;
    let first = service.create_order();
    service.persist_active().await.unwrap();
    let second = service.create_order();
    service.close_order().await.unwrap();

    assert_eq!(service.load_open_orders().await.unwrap(), 1);
    assert!(service.order(&first).is_some());
    assert!(service.order(&second).is_none());
    assert!(service.active_order().is_none());
}

#[tokio::test]
async fn open_order_pulls_a_closed_order_back_into_the_session() {
    let (mut service, _db) = create_test_service().await;
    let order_id = service.create_order();
    service.close_order().await.unwrap();
    service.load_open_orders().await.unwrap();
    assert!(service.order(&order_id).is_none());

    service.open_order(&order_id).await.unwrap();
    let order = service.active_order().unwrap();
    assert_eq!(order.id, order_id);
    assert_eq!(order.status, OrderStatus::Closed);

    let err = service.open_order("O209901010001").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn deleting_an_order_never_recycles_its_number() {
    let (mut service, db) = create_test_service().await;
    let first = service.create_order();
    service.persist_active().await.unwrap();
    service.delete_order(&first).await.unwrap();

    assert!(service.active_order().is_none());
    assert!(service.order(&first).is_none());

    // Same session continues past the deleted number
    let second = service.create_order();
    assert!(second > first);
    service.persist_active().await.unwrap();
    service.delete_order(&second).await.unwrap();

    // A restarted session over an empty orders table still seeds from
    // the historical maximum, not live rows
    let mut restarted = OrderService::new(&db, TEST_TZ).await;
    let third = restarted.create_order();
    assert!(third > second);
}

#[tokio::test]
async fn delete_reports_whether_a_row_existed() {
    let (mut service, _db) = create_test_service().await;
    let order_id = service.create_order();
    // Never persisted: no row, but the working set entry still goes away
    assert!(!service.delete_order(&order_id).await.unwrap());
    assert!(service.order(&order_id).is_none());
}

#[tokio::test]
async fn flush_dirty_coalesces_pending_edits() {
    let (mut service, db) = create_test_service().await;
    let first = service.create_order();
    service.add_dish().unwrap();
    service.add_product(&taco()).unwrap();
    let second = service.create_order();

    assert!(service.has_unsaved_edits());
    assert_eq!(service.flush_dirty().await.unwrap(), 2);
    assert!(!service.has_unsaved_edits());
    assert_eq!(service.flush_dirty().await.unwrap(), 0);

    let stored_first = crate::db::repository::order::load_order(&db.pool, &first)
        .await
        .unwrap();
    assert_eq!(stored_first.total_amount, 30.0);
    assert!(
        crate::db::repository::order::load_order(&db.pool, &second)
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn the_graph_survives_a_process_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("orders.db");
    let db_path = db_path.to_str().unwrap();

    let order_id;
    {
        let db = DbService::new(db_path).await.unwrap();
        let mut service = OrderService::new(&db, TEST_TZ).await;
        order_id = service.create_order();
        service.add_dish().unwrap();
        service.add_product(&taco()).unwrap();
        service.persist_active().await.unwrap();
        db.pool.close().await;
    }

    let db = DbService::new(db_path).await.unwrap();
    let mut service = OrderService::new(&db, TEST_TZ).await;
    assert_eq!(service.load_open_orders().await.unwrap(), 1);
    service.select_order(&order_id).unwrap();
    assert_eq!(service.active_order().unwrap().total_amount, 30.0);

    // The identifier sequence continues from the persisted history
    let next_id = service.create_order();
    assert!(next_id > order_id);
    db.pool.close().await;
}
