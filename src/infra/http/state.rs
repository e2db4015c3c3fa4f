use std::sync::Arc;

use crate::application::cache::ContentCache;
use crate::application::content::chairmen::ChairmenService;
use crate::application::content::contacts::ContactsService;
use crate::application::content::news::NewsService;
use crate::application::content::projects::ProjectsService;
use crate::application::content::rates::RatesService;
use crate::application::content::ticker::TickerService;
use crate::application::stream::ChangeHub;
use crate::infra::rate_limit::SubmitRateLimiter;
use crate::infra::recaptcha::RecaptchaVerifier;
use crate::infra::uploads::UploadStorage;

#[derive(Clone)]
pub struct ApiState {
    pub rates: Arc<RatesService>,
    pub chairmen: Arc<ChairmenService>,
    pub news: Arc<NewsService>,
    pub ticker: Arc<TickerService>,
    pub projects: Arc<ProjectsService>,
    pub contacts: Arc<ContactsService>,
    pub hub: Arc<ChangeHub>,
    pub cache: Arc<ContentCache>,
    pub storage: Arc<UploadStorage>,
    pub submit_limiter: Arc<SubmitRateLimiter>,
    pub recaptcha: Arc<RecaptchaVerifier>,
}
