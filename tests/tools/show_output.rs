use salon_turn_board_lib::application::dto::BoardView;

/// テスト失敗時に見やすいようにボードを出力する (`cargo test -- --nocapture`)
pub fn show_board_debug_data(view: &BoardView) {
    println!("\n=======================================================");
    println!("🗓️ [DEBUG] {} ({})", view.date_label, view.date);
    println!("=======================================================");

    match &view.selected_service {
        Some(code) => println!("   選択中メニュー: {}", code),
        None => println!("   選択中メニュー: (なし)"),
    }
    if view.highlights.is_empty() {
        println!("   ハイライト: (なし)");
    } else {
        println!("   ハイライト: {}", view.highlights.join(", "));
    }

    for row in view.occupied_rows() {
        let mark = if row.highlighted { "★" } else { "  " };
        let cells: Vec<String> = row
            .cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| !cell.is_empty())
            .map(|(i, cell)| format!("[{}]{}", i + 1, cell))
            .collect();

        println!(
            "   {:>2} {}{:<10} {:<5} 施術量 {:>4.1} | {}",
            row.row,
            mark,
            row.worker_name,
            row.time_in,
            row.load,
            if cells.is_empty() { "(なし)".to_string() } else { cells.join(" ") }
        );
    }
    println!("=======================================================\n");
}
