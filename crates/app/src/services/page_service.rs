use anyhow::{anyhow, Context, Result};
use scoreday_core::components::{FilterRedirect, ScoreDisplay, ScoreEntryForm, StatusBanner};
use scoreday_core::domain::{
    CompletionSignal, Event, EventRow, QueryString, RedirectRequest, ScoreControl,
    Scoreboard, SportsDay, StatusCue, StatusIndicator, SubmissionEnvelope, SubmissionStatus,
    ACTIVITY_KEY, ALL_SENTINEL, GROUP_KEY, YEAR_KEY,
};
use scoreday_core::ports::{Location, ScoreStore};
use scoreday_core::{Delivery, EventBus, Subscription};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Commands the UI can issue against the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCommand {
    /// Submit every score on a visible row
    Submit { row: usize },
    /// Move one form's score on a row through the score options
    CycleScore { row: usize, form: usize, step: isize },
    /// Move a filter to its next value, wrapping back to `all`
    CycleFilter { key: &'static str },
    Quit,
}

/// The page's navigation URL. Only the query part matters here.
#[derive(Debug, Default)]
pub struct PageLocation {
    search: RefCell<String>,
}

impl PageLocation {
    pub fn new(search: impl Into<String>) -> Self {
        Self {
            search: RefCell::new(search.into()),
        }
    }

    pub fn navigate(&self, query: impl Into<String>) {
        *self.search.borrow_mut() = query.into();
    }
}

impl Location for PageLocation {
    fn search(&self) -> String {
        self.search.borrow().clone()
    }
}

/// A visible event row and the form scoring it
pub struct MountedRow {
    pub row: EventRow,
    pub form: ScoreEntryForm,
}

/// Read-only copy of the page for rendering
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSnapshot {
    pub query: String,
    pub banner: String,
    /// Form names in column order
    pub forms: Vec<String>,
    /// Form colours, same order as `forms`
    pub form_colours: Vec<String>,
    pub rows: Vec<RowSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSnapshot {
    pub id: String,
    pub name: String,
    pub year: String,
    pub group: String,
    /// Shown score per form, in column order
    pub values: Vec<String>,
    pub status: SubmissionStatus,
    pub cue: Option<StatusCue>,
}

/// Owns the page: the bus, the banner, the filter coordinator and one
/// mounted form per visible event row.
///
/// Submissions leave through `outbound`; backend replies come back in
/// through `handle_inbound`. A redirect request is followed by re-mounting
/// the rows for the new query, as a page load would.
pub struct PageService {
    bus: Rc<EventBus>,
    sheet: SportsDay,
    store: Arc<dyn ScoreStore>,
    location: Rc<PageLocation>,
    banner: StatusBanner,
    redirect: FilterRedirect,
    rows: Vec<MountedRow>,
    navigation: Rc<RefCell<Option<String>>>,
    subscriptions: Vec<Subscription>,
}

impl PageService {
    pub fn new(
        sheet: SportsDay,
        store: Arc<dyn ScoreStore>,
        outbound: mpsc::UnboundedSender<SubmissionEnvelope>,
        query: &str,
    ) -> Result<Self> {
        let bus = EventBus::new();
        let location = Rc::new(PageLocation::new(QueryString::parse(query).to_string()));

        let stored = store.load_all().context("Failed to load stored scores")?;
        let standings = Scoreboard::tally(&sheet.rows(), &stored, &sheet.forms);
        let banner = StatusBanner::mount(Rc::clone(&bus), standings.render_fragment(&sheet));

        let redirect = FilterRedirect::new(Rc::clone(&bus), Rc::clone(&location) as Rc<dyn Location>);

        let navigation = Rc::new(RefCell::new(None));
        let target = Rc::clone(&navigation);
        let follow = bus.subscribe_to::<RedirectRequest, _>(move |request| {
            *target.borrow_mut() = Some(request.query.clone());
            Ok(())
        });

        let forward = bus.subscribe_to::<SubmissionEnvelope, _>(move |envelope| {
            outbound
                .send(envelope.clone())
                .map_err(|_| anyhow!("Score backend is not running"))
        });

        let mut page = Self {
            bus,
            sheet,
            store,
            location,
            banner,
            redirect,
            rows: Vec::new(),
            navigation,
            subscriptions: vec![follow, forward],
        };
        page.mount_rows()?;
        Ok(page)
    }

    pub fn bus(&self) -> &Rc<EventBus> {
        &self.bus
    }

    pub fn rows(&self) -> &[MountedRow] {
        &self.rows
    }

    pub fn query(&self) -> String {
        self.location.search()
    }

    pub fn banner(&self) -> String {
        self.banner.content()
    }

    pub fn pending_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|mounted| mounted.form.status().is_pending())
            .count()
    }

    /// Drop the current rows and mount the ones the query selects, each
    /// showing its stored scores and starting out completed
    pub fn mount_rows(&mut self) -> Result<()> {
        self.rows.clear();

        let stored = self.store.load_all().context("Failed to load stored scores")?;
        let query = QueryString::parse(&self.location.search());

        for row in self.sheet.rows().into_iter().filter(|row| row.matches(&query)) {
            let mut controls: Vec<ScoreControl> = self
                .sheet
                .forms
                .iter()
                .map(|form| ScoreControl::tagged(row.control_id(&form.id), form.id.clone()))
                .collect();

            let raw = stored.get(&row.id).map(String::as_str).unwrap_or("{}");
            ScoreDisplay::initialize(&mut controls, raw);

            let form = ScoreEntryForm::mount(
                Rc::clone(&self.bus),
                row.id.clone(),
                controls,
                SubmissionStatus::Completed,
                Some(StatusIndicator::new(StatusCue::Confirmed)),
            );
            self.rows.push(MountedRow { row, form });
        }

        info!("Mounted {} row(s) for query {}", self.rows.len(), self.query());
        Ok(())
    }

    /// Publish an event that arrived from the backend
    pub fn handle_inbound(&mut self, event: Event) -> Result<Delivery> {
        if let Event::Completion(CompletionSignal { event_id: None }) = &event {
            let pending = self.pending_count();
            if pending > 1 {
                warn!("Un-keyed completion acknowledges {} pending rows at once", pending);
            }
        }

        let delivery = self.bus.publish(event);
        self.follow_navigation()?;
        Ok(delivery)
    }

    pub fn execute(&mut self, command: PageCommand) -> Result<()> {
        match command {
            PageCommand::Submit { row } => {
                self.submit(row)?;
            }
            PageCommand::CycleScore { row, form, step } => {
                self.cycle_score(row, form, step)?;
            }
            PageCommand::CycleFilter { key } => {
                self.cycle_filter(key)?;
            }
            PageCommand::Quit => {
                debug!("Quit needs no page action");
            }
        }
        Ok(())
    }

    pub fn submit(&self, row: usize) -> Result<SubmissionEnvelope> {
        let mounted = self.row(row)?;
        Ok(mounted.form.submit())
    }

    /// Set the score a row shows for `form_id`; not submitted until `submit`
    pub fn set_score(&self, row: usize, form_id: &str, value: &str) -> Result<()> {
        self.row(row)?.form.set_value(form_id, value)?;
        Ok(())
    }

    pub fn cycle_score(&self, row: usize, form: usize, step: isize) -> Result<String> {
        let form_id = self
            .sheet
            .forms
            .get(form)
            .map(|form| form.id.clone())
            .ok_or_else(|| anyhow!("No form at column {}", form))?;

        let options = self.sheet.score_options();
        let current = self.row(row)?.form.value(&form_id).unwrap_or_default();
        let next = step_through(&options, &current, step);

        self.set_score(row, &form_id, &next)?;
        Ok(next)
    }

    /// Apply a filter selection and follow the resulting redirect
    pub fn apply_filter(&mut self, key: &str, value: &str) -> Result<String> {
        let query = self.redirect.apply(key, value);
        self.follow_navigation()?;
        Ok(query)
    }

    pub fn cycle_filter(&mut self, key: &str) -> Result<String> {
        let options = self.filter_options(key);
        let query = QueryString::parse(&self.location.search());
        let current = query.get(key).unwrap_or(ALL_SENTINEL).to_string();
        let next = step_through(&options, &current, 1);
        self.apply_filter(key, &next)
    }

    /// Values a filter can take, starting with `all`
    pub fn filter_options(&self, key: &str) -> Vec<String> {
        let mut options = vec![ALL_SENTINEL.to_string()];
        match key {
            YEAR_KEY => options.extend(self.sheet.years.iter().map(|year| year.id.clone())),
            GROUP_KEY => options.extend(self.sheet.genders.iter().cloned()),
            ACTIVITY_KEY => options.extend(self.sheet.events.iter().map(|event| event.id.clone())),
            _ => {}
        }
        options
    }

    pub fn snapshot(&self) -> PageSnapshot {
        PageSnapshot {
            query: self.query(),
            banner: self.banner(),
            forms: self.sheet.forms.iter().map(|form| form.name.clone()).collect(),
            form_colours: self.sheet.forms.iter().map(|form| form.colour.clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|mounted| RowSnapshot {
                    id: mounted.row.id.clone(),
                    name: mounted.row.name.clone(),
                    year: self
                        .sheet
                        .year(&mounted.row.year_id)
                        .map(|year| year.name.clone())
                        .unwrap_or_else(|| mounted.row.year_id.clone()),
                    group: mounted.row.gender_id.clone(),
                    values: self
                        .sheet
                        .forms
                        .iter()
                        .map(|form| mounted.form.value(&form.id).unwrap_or_default())
                        .collect(),
                    status: mounted.form.status(),
                    cue: mounted.form.cue(),
                })
                .collect(),
        }
    }

    fn row(&self, index: usize) -> Result<&MountedRow> {
        self.rows
            .get(index)
            .ok_or_else(|| anyhow!("No row at position {}", index))
    }

    fn follow_navigation(&mut self) -> Result<bool> {
        let Some(query) = self.navigation.borrow_mut().take() else {
            return Ok(false);
        };

        if self.pending_count() > 0 {
            info!("Navigating away with {} unacknowledged row(s)", self.pending_count());
        }
        self.location.navigate(query);
        self.mount_rows()?;
        Ok(true)
    }
}

impl Drop for PageService {
    fn drop(&mut self) {
        for subscription in &self.subscriptions {
            self.bus.unsubscribe(subscription);
        }
    }
}

fn step_through(options: &[String], current: &str, step: isize) -> String {
    if options.is_empty() {
        return current.to_string();
    }
    let len = options.len() as isize;
    let position = options.iter().position(|option| option == current).unwrap_or(0) as isize;
    let next = (position + step).rem_euclid(len) as usize;
    options[next].clone()
}
