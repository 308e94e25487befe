fn main() -> anyhow::Result<()> {
    let command_line_interface = denorm::cli::CommandLineInterface::load();
    command_line_interface.run()
}
