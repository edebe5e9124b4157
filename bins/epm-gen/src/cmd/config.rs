use clap::{Args, Parser, Subcommand};

use epm_api::DEFAULT_COUNT;

// ═══════════════════════════════════════════════════════════════
//  CLI args
// ═══════════════════════════════════════════════════════════════

#[derive(Parser)]
#[command(name = "epm-gen", about = "Генерация, разбор и отправка EPM-потоков")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Записать поток случайных записей в файл
    Generate(GenerateArgs),
    /// Разобрать файл потока и напечатать записи
    Inspect(InspectArgs),
    /// Скачать поток с сервера (`GET /stream`)
    Fetch(FetchArgs),
    /// Отправить файл потока на сервер (`POST /submit`)
    Submit(SubmitArgs),
}

#[derive(Args, Clone, Debug)]
pub struct GenerateArgs {
    /// Число записей
    #[arg(long, default_value_t = DEFAULT_COUNT)]
    pub count: usize,

    /// Выходной файл
    #[arg(long, default_value = "stream.fb")]
    pub out: String,

    /// Seed для PRNG (без указания берётся энтропия ОС)
    #[arg(long, env = "EPM_SEED")]
    pub seed: Option<u64>,
}

#[derive(Args, Clone, Debug)]
pub struct InspectArgs {
    /// Файл потока
    pub path: String,

    /// Не печатать записи, только итог
    #[arg(long)]
    pub quiet: bool,
}

#[derive(Args, Clone, Debug)]
pub struct FetchArgs {
    /// Адрес сервера
    #[arg(long, default_value = "http://127.0.0.1:8080", env = "EPM_URL")]
    pub url: String,

    /// Число записей (без указания используется значение сервера)
    #[arg(long)]
    pub count: Option<i64>,

    /// Куда сохранить поток
    #[arg(long, default_value = "stream.fb")]
    pub out: String,
}

#[derive(Args, Clone, Debug)]
pub struct SubmitArgs {
    /// Адрес сервера
    #[arg(long, default_value = "http://127.0.0.1:8080", env = "EPM_URL")]
    pub url: String,

    /// Файл потока
    pub path: String,
}

/// `base` + `path` без двойного слэша.
pub fn endpoint(base: &str, path: &str) -> String {
    format!("{}{path}", base.trim_end_matches('/'))
}
