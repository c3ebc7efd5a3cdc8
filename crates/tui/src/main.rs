fn main() {
    if let Err(e) = webhook_tui::run() {
        eprintln!("webhook-tui: {e:#}");
        std::process::exit(1);
    }
}
