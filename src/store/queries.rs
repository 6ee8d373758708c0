// -- Items

/// Create item
pub const INSERT_ITEM: &str = r#"
    INSERT INTO items (name, description, starting_price, current_price, status, end_time, seller_id, created_at)
    VALUES ($1, $2, $3, $3, $4, $5, $6, $7)
    RETURNING id, name, description, starting_price, current_price, status, end_time, seller_id, created_at
"#;

/// Get item
pub const GET_ITEM: &str =
    "SELECT id, name, description, starting_price, current_price, status, end_time, seller_id, created_at FROM items WHERE id = $1";

/// Get item, locking the row until the transaction ends
pub const GET_ITEM_FOR_UPDATE: &str =
    "SELECT id, name, description, starting_price, current_price, status, end_time, seller_id, created_at FROM items WHERE id = $1 FOR UPDATE";

/// All items
pub const GET_ALL_ITEMS: &str =
    "SELECT id, name, description, starting_price, current_price, status, end_time, seller_id, created_at FROM items ORDER BY created_at DESC, id DESC";

/// Items with a given status
pub const GET_ITEMS_BY_STATUS: &str =
    "SELECT id, name, description, starting_price, current_price, status, end_time, seller_id, created_at FROM items WHERE status = $1 ORDER BY created_at DESC, id DESC";

/// Item current price
pub const GET_ITEM_CURRENT_PRICE: &str = "SELECT current_price FROM items WHERE id = $1";

/// Change item status
pub const UPDATE_ITEM_STATUS: &str = r#"
    UPDATE items SET status = $2 WHERE id = $1
    RETURNING id, name, description, starting_price, current_price, status, end_time, seller_id, created_at
"#;

/// Delete item (bids cascade)
pub const DELETE_ITEM: &str = r#"
    DELETE FROM items WHERE id = $1
    RETURNING id, name, description, starting_price, current_price, status, end_time, seller_id, created_at
"#;

/// Close every expired open auction
pub const CLOSE_EXPIRED_ITEMS: &str = r#"
    UPDATE items SET status = 'closed'
    WHERE status = 'open' AND end_time <= $1
    RETURNING id, name, description, starting_price, current_price, status, end_time, seller_id, created_at
"#;

// -- Bids

/// Compare-and-swap on the current price; matches no row unless the bid is acceptable
pub const RAISE_CURRENT_PRICE: &str = r#"
    UPDATE items SET current_price = $2
    WHERE id = $1 AND status = 'open' AND end_time > $3 AND current_price < $2
    RETURNING id
"#;

/// Record bid
pub const INSERT_BID: &str = r#"
    INSERT INTO bids (item_id, user_id, bid_amount, created_at)
    VALUES ($1, $2, $3, $4)
    RETURNING id, item_id, user_id, bid_amount, created_at
"#;

/// Item bids, highest first
pub const GET_ITEM_BIDS: &str = r#"
    SELECT id, item_id, user_id, bid_amount, created_at
    FROM bids
    WHERE item_id = $1
    ORDER BY bid_amount DESC, created_at ASC, id ASC
"#;

/// Highest bid
pub const GET_HIGHEST_BID: &str = r#"
    SELECT id, item_id, user_id, bid_amount, created_at
    FROM bids
    WHERE item_id = $1
    ORDER BY bid_amount DESC, created_at ASC, id ASC
    LIMIT 1
"#;

/// Delete bid
pub const DELETE_BID: &str =
    "DELETE FROM bids WHERE id = $1 RETURNING id, item_id, user_id, bid_amount, created_at";

// -- Orders

/// Create order
pub const INSERT_ORDER: &str = r#"
    INSERT INTO orders (buyer_id, total_price, status, created_at, updated_at)
    VALUES ($1, $2, 'pending', $3, $3)
    RETURNING id, buyer_id, total_price, status, created_at, updated_at
"#;

/// Add order line
pub const INSERT_ORDER_LINE: &str =
    "INSERT INTO order_lines (order_id, position, item_id, quantity) VALUES ($1, $2, $3, $4)";

/// Get order
pub const GET_ORDER: &str =
    "SELECT id, buyer_id, total_price, status, created_at, updated_at FROM orders WHERE id = $1";

/// Get order, locking the row until the transaction ends
pub const GET_ORDER_FOR_UPDATE: &str =
    "SELECT id, buyer_id, total_price, status, created_at, updated_at FROM orders WHERE id = $1 FOR UPDATE";

/// All orders
pub const GET_ALL_ORDERS: &str =
    "SELECT id, buyer_id, total_price, status, created_at, updated_at FROM orders ORDER BY created_at DESC, id DESC";

/// Orders of one buyer
pub const GET_ORDERS_BY_BUYER: &str =
    "SELECT id, buyer_id, total_price, status, created_at, updated_at FROM orders WHERE buyer_id = $1 ORDER BY created_at DESC, id DESC";

/// Lines of a set of orders
pub const GET_ORDER_LINES: &str = r#"
    SELECT order_id, item_id, quantity
    FROM order_lines
    WHERE order_id = ANY($1)
    ORDER BY order_id, position
"#;

/// Change order status
pub const UPDATE_ORDER_STATUS: &str = r#"
    UPDATE orders SET status = $2, updated_at = $3 WHERE id = $1
    RETURNING id, buyer_id, total_price, status, created_at, updated_at
"#;
