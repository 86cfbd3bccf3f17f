pub mod events;
pub mod state;
pub mod ui;

use color_eyre::eyre::Result;
use crossterm::event::{self, Event};
use ratatui::DefaultTerminal;

use crate::analysis::AnalysisResult;
use state::ReportState;

/// Full-screen view of one analysis. Blocks until the user quits.
pub fn run_report_view(result: AnalysisResult) -> Result<()> {
    color_eyre::install()?;

    let mut state = ReportState::new(result);
    let terminal = ratatui::init();
    let outcome = run(terminal, &mut state);
    ratatui::restore();

    outcome
}

fn run(mut terminal: DefaultTerminal, state: &mut ReportState) -> Result<()> {
    loop {
        terminal.draw(|f| ui::render(f, state))?;
        if let Event::Key(key) = event::read()?
            && events::handle_key(key, state)
        {
            break;
        }
    }
    Ok(())
}
