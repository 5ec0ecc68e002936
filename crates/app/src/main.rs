mod client;
mod config;
mod error;
mod export;
mod render;

use engine::{
    Clock, FilterError, LedgerQueryService, Phase, SystemClock, TransactionType, YearMonth,
    bookkeeper::Bookkeeper, filter::FilterField,
};

use crate::{
    client::HttpLedger,
    config::{AddArgs, Command, ReportArgs},
    error::{AppError, Result},
    export::CsvExporter,
    render::Renderer,
};

type Books = Bookkeeper<HttpLedger, SystemClock>;

#[tokio::main]
async fn main() -> Result<()> {
    let (config, command) = config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "ledgerbook={level},engine={level}",
            level = config.level
        ))
        .init();

    let clock = SystemClock::from_name(&config.timezone).map_err(AppError::Setting)?;
    let client = HttpLedger::new(&config.base_url)?;
    tracing::debug!(base_url = %config.base_url, today = %clock.today(), "starting");

    let mut books = Bookkeeper::new(client, clock, &config.default_payment_method);
    let renderer = Renderer::new(&config.currency_symbol);

    match command {
        Command::Report(args) => report(&mut books, &renderer, args).await,
        Command::Today => today(&mut books, &renderer).await,
        Command::Add(args) => add(&mut books, &renderer, args).await,
        Command::Dashboard { month } => dashboard(&mut books, &renderer, month).await,
        Command::Categories { kind } => categories(books.service(), kind).await,
        Command::PaymentMethods => {
            let methods = books.service().list_payment_methods().await?;
            print!("{}", render::payment_methods(&methods));
            Ok(())
        }
    }
}

async fn report(books: &mut Books, renderer: &Renderer<'_>, args: ReportArgs) -> Result<()> {
    books.load_report_options().await?;

    if args.from.is_some() || args.to.is_some() {
        let start = args.from.or(books.report().criteria().start_date);
        books.set_report_field(FilterField::StartDate(None)).await?;
        if let Some(to) = args.to {
            books.set_report_field(FilterField::EndDate(Some(to))).await?;
        }
        books.set_report_field(FilterField::StartDate(start)).await?;
    }
    if let Some(kind) = args.kind {
        books.set_report_field(FilterField::Type(Some(kind))).await?;
    }
    if let Some(wanted) = args.category {
        if books.report().criteria().kind.is_none() {
            return Err(FilterError::CategoryWithoutType.into());
        }
        let category = books
            .report()
            .cascade()
            .categories()
            .iter()
            .find(|c| c.id == wanted || c.name.eq_ignore_ascii_case(&wanted))
            .cloned()
            .ok_or_else(|| AppError::Setting(format!("unknown account head {wanted}")))?;
        books
            .set_report_field(FilterField::Category(Some(category)))
            .await?;
    }
    if let Some(wanted) = args.payment_method {
        let id = books
            .report()
            .payment_methods()
            .iter()
            .find(|m| m.id == wanted || m.name.eq_ignore_ascii_case(&wanted))
            .map(|m| m.id.clone())
            .ok_or_else(|| AppError::Setting(format!("unknown payment method {wanted}")))?;
        books
            .set_report_field(FilterField::PaymentMethod(Some(id)))
            .await?;
    }
    if args.search.is_some() {
        books.set_report_field(FilterField::Search(args.search)).await?;
    }

    books.set_include_opening(args.include_opening).await;
    books.build_report().await;

    let view = books.report();
    if let Some(err) = view.aggregator().error() {
        return Err(err.clone().into());
    }
    if let Some(err) = view.aggregator().opening().error() {
        tracing::warn!("opening balance unavailable: {err}");
    }

    if let Some(path) = args.export {
        let document = view.export(&CsvExporter)?;
        std::fs::write(&path, &document.bytes)?;
        tracing::info!(path = %path.display(), file = %document.file_name, "statement written");
        return Ok(());
    }

    if let Some(report) = view.report() {
        print!("{}", renderer.report(report, view.including_opening()));
    }
    Ok(())
}

async fn today(books: &mut Books, renderer: &Renderer<'_>) -> Result<()> {
    books.refresh_today().await;
    let view = books.today();
    if view.credit().phase() == Phase::Failed && view.debit().phase() == Phase::Failed {
        if let Some(err) = view.credit().error() {
            return Err(err.clone().into());
        }
    }
    print!("{}", renderer.today(view));
    Ok(())
}

async fn add(books: &mut Books, renderer: &Renderer<'_>, args: AddArgs) -> Result<()> {
    books.load_today_options().await?;
    books.set_today_draft_kind(Some(args.kind)).await;

    let view = books.today();
    let category = view
        .categories()
        .categories()
        .iter()
        .find(|c| c.id == args.category || c.name.eq_ignore_ascii_case(&args.category))
        .cloned()
        .ok_or_else(|| AppError::Setting(format!("unknown account head {}", args.category)))?;
    let method = match &args.payment_method {
        Some(wanted) => Some(
            view.payment_methods()
                .iter()
                .find(|m| &m.id == wanted || m.name.eq_ignore_ascii_case(wanted))
                .map(|m| m.id.clone())
                .ok_or_else(|| AppError::Setting(format!("unknown payment method {wanted}")))?,
        ),
        None => None,
    };

    let draft = books.today_mut().draft_mut();
    draft.set_category(Some(category))?;
    draft.set_amount_text(&args.amount)?;
    if method.is_some() {
        draft.payment_method = method;
    }
    draft.remarks = args.remarks;

    let saved = books.submit_today().await?;
    tracing::info!(id = %saved.id, amount = %saved.amount, "transaction recorded");
    print!("{}", renderer.today(books.today()));
    Ok(())
}

async fn dashboard(
    books: &mut Books,
    renderer: &Renderer<'_>,
    month: Option<YearMonth>,
) -> Result<()> {
    match month {
        Some(month) => books.load_dashboard(month).await,
        None => books.load_current_dashboard().await,
    };
    let view = books.dashboard();
    if let Some(err) = view.error() {
        return Err(err.clone().into());
    }
    if let Some((month, analytics)) = view.analytics() {
        print!("{}", renderer.dashboard(month, analytics));
    }
    Ok(())
}

async fn categories(service: &HttpLedger, kind: Option<TransactionType>) -> Result<()> {
    let mut listed = Vec::new();
    let kinds = match kind {
        Some(kind) => vec![kind],
        None => TransactionType::ALL.to_vec(),
    };
    for kind in kinds {
        for category in service.list_categories(kind).await? {
            if !listed.iter().any(|c: &engine::Category| c.id == category.id) {
                listed.push(category);
            }
        }
    }
    print!("{}", render::categories(&listed));
    Ok(())
}
