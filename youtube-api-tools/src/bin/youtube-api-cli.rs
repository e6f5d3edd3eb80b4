use eyre::{Context, bail};
use serde::Serialize;
use std::io::IsTerminal;
use tokio_stream::StreamExt;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use youtube_api_tools::youtube_api::{ChannelFilter, PageRequest, PlaylistFilter, PlaylistItemFilter};
use youtube_api_tools::{Config, ResourceFamily, Session, authenticate_from_config, resolve_by_name};

#[derive(argh::FromArgs)]
#[argh(description = "Poke at the YouTube Data API as the authenticated user")]
struct Options {
    #[argh(subcommand)]
    subcommand: SubCommand,
}

#[derive(argh::FromArgs)]
#[argh(subcommand)]
enum SubCommand {
    Resolve(ResolveOptions),
    MyChannels(MyChannelsOptions),
    MyPlaylists(MyPlaylistsOptions),
    Video(VideoOptions),
    PlaylistItems(PlaylistItemsOptions),
}

#[derive(argh::FromArgs)]
#[argh(subcommand, name = "resolve", description = "resolve a name to its ID")]
struct ResolveOptions {
    #[argh(positional, description = "channel, playlist or video")]
    family: String,

    #[argh(positional, description = "the title to look for")]
    name: String,

    #[argh(switch, description = "match the title case-sensitively")]
    exact: bool,
}

#[derive(argh::FromArgs)]
#[argh(subcommand, name = "my-channels", description = "list your channels")]
struct MyChannelsOptions {}

#[derive(argh::FromArgs)]
#[argh(subcommand, name = "my-playlists", description = "list your playlists")]
struct MyPlaylistsOptions {}

#[derive(argh::FromArgs)]
#[argh(subcommand, name = "video", description = "show one video")]
struct VideoOptions {
    #[argh(positional, description = "the video ID")]
    id: String,
}

#[derive(argh::FromArgs)]
#[argh(
    subcommand,
    name = "playlist-items",
    description = "list every item of a playlist"
)]
struct PlaylistItemsOptions {
    #[argh(positional, description = "the playlist ID")]
    playlist_id: String,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let options: Options = argh::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env();
    let session = authenticate_from_config(&config)
        .await
        .context("authenticate")?;

    match options.subcommand {
        SubCommand::Resolve(options) => {
            let family = match options.family.as_str() {
                "channel" => ResourceFamily::Channel,
                "playlist" => ResourceFamily::Playlist,
                "video" => ResourceFamily::Video,
                other => bail!("cannot resolve names of {other:?}"),
            };
            let id = resolve_by_name(&session, family, &options.name, !options.exact)
                .await
                .with_context(|| format!("resolve {family} {:?}", options.name))?;
            println!("{id}");
        }
        SubCommand::MyChannels(_) => {
            let channels = session
                .channels()
                .list(&["id", "snippet"], &ChannelFilter::Mine, &PageRequest::default())
                .await
                .context("list channels")?;
            print_json(&channels.items)?;
        }
        SubCommand::MyPlaylists(_) => {
            let playlists = session
                .playlists()
                .list_all(&["id", "snippet", "status"], PlaylistFilter::Mine);
            print_all(playlists).await.context("list playlists")?;
        }
        SubCommand::Video(options) => {
            let video = session
                .videos()
                .get(&["id", "snippet", "status", "statistics"], &options.id)
                .await
                .with_context(|| format!("fetch video {}", options.id))?;
            print_json(&video)?;
        }
        SubCommand::PlaylistItems(options) => {
            print_playlist_items(&session, options.playlist_id).await?;
        }
    }

    Ok(())
}

async fn print_playlist_items(session: &Session, playlist_id: String) -> eyre::Result<()> {
    let items = session.playlist_items().list_all(
        &["id", "snippet", "contentDetails"],
        PlaylistItemFilter::PlaylistId(playlist_id.clone()),
    );
    print_all(items)
        .await
        .with_context(|| format!("list items of {playlist_id}"))
}

async fn print_all<T, S>(records: S) -> eyre::Result<()>
where
    T: Serialize,
    S: tokio_stream::Stream<Item = youtube_api_tools::Result<T>>,
{
    let mut records = std::pin::pin!(records);
    let mut count = 0usize;
    while let Some(record) = records.next().await {
        print_json(&record?)?;
        count += 1;
    }
    tracing::info!(count, "done");
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> eyre::Result<()> {
    let json = serde_json::to_string_pretty(value).context("serialize")?;
    println!("{json}");
    Ok(())
}
