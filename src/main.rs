fn main() -> std::process::ExitCode {
    ssh_key_exchange_lib::run()
}
