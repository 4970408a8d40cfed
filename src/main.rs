fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set up logging for development
    env_logger::init();

    // Run the viewer application
    pgt_viewer::run_app()
}
