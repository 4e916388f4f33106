use clap::{Parser, Subcommand};
use coursehub::model::entity::{
    Chapter, ChapterCreate, Course, CourseCreate, PurchaseCode, UserEntity,
    UserEntityCreateUpdate,
};
use coursehub::model::{CrudRepository, DatabaseError, DbConnection, ModelManager};
use coursehub::web::dto::chapters::ChapterUpdateBody;
use coursehub::web::{AuthenticatedUser, UserRole};

#[derive(Parser, Debug)]
#[command(about = "CLI tool for seeding the coursehub DB", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage users and balances
    User {
        #[command(subcommand)]
        action: UserCommands,
    },

    /// Manage courses
    Course {
        #[command(subcommand)]
        action: CourseCommands,
    },

    /// Manage chapters
    Chapter {
        #[command(subcommand)]
        action: ChapterCommands,
    },

    /// Manage purchase codes
    Codes {
        #[command(subcommand)]
        action: CodesCommands,
    },
}

/// User management
#[derive(Subcommand, Debug)]
pub enum UserCommands {
    Add {
        #[arg(long)]
        phone: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        password: String,
        /// student, teacher or admin
        #[arg(long, default_value = "student")]
        role: String,
    },
    Credit {
        #[arg(long)]
        phone: String,
        /// Minor currency units
        #[arg(long)]
        amount: i64,
        #[arg(long, default_value = "Balance top-up")]
        description: String,
    },
}

/// Course management
#[derive(Subcommand, Debug)]
pub enum CourseCommands {
    Add {
        /// Phone number of the authoring teacher
        #[arg(long)]
        owner_phone: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value_t = 0)]
        price: i64,
    },
}

/// Chapter management
#[derive(Subcommand, Debug)]
pub enum ChapterCommands {
    Add {
        /// Course title to attach the chapter to
        #[arg(long)]
        course_title: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        video_url: Option<String>,
        #[arg(long, default_value_t = false)]
        free: bool,
        #[arg(long, default_value_t = false)]
        published: bool,
    },
}

/// Purchase code management
#[derive(Subcommand, Debug)]
pub enum CodesCommands {
    Generate {
        #[arg(long)]
        course_title: String,
        #[arg(long, default_value_t = 10)]
        count: i64,
    },
}

async fn user_by_phone(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    phone: &str,
) -> Result<UserEntity, DatabaseError> {
    UserEntity::find_by_phone(mm, actor, phone)
        .await?
        .ok_or_else(|| DatabaseError::Invalid(format!("no user with phone number {phone}")))
}

async fn course_by_title(mm: &ModelManager, title: &str) -> Result<Course, DatabaseError> {
    Course::find_by_title(mm, title)
        .await?
        .ok_or_else(|| DatabaseError::Invalid(format!("no course titled \"{title}\"")))
}

#[tokio::main]
async fn main() -> coursehub::error::AppResult<()> {
    let _ = dotenvy::dotenv();
    let args = Cli::parse();

    let database_url = std::env::var("DATABASE_URL").map_err(|_| {
        std::io::Error::new(std::io::ErrorKind::NotFound, "DATABASE_URL is not set")
    })?;
    let db_con = DbConnection::connect(&database_url)?;
    let mm = ModelManager::new(db_con);
    let actor = AuthenticatedUser::admin();

    match args.command {
        Commands::User { action } => match action {
            UserCommands::Add {
                phone,
                name,
                password,
                role,
            } => {
                let role = UserRole::parse(&role)
                    .ok_or_else(|| DatabaseError::Invalid(format!("unknown role '{role}'")))?;
                let user = UserEntity::create(
                    &mm,
                    &actor,
                    UserEntityCreateUpdate {
                        phone_number: phone,
                        full_name: name,
                        password_hash: coursehub::auth::hash_password(&password)?,
                        role,
                    },
                )
                .await?;
                println!("User created: {:?}", user);
            }

            UserCommands::Credit {
                phone,
                amount,
                description,
            } => {
                let user = user_by_phone(&mm, &actor, &phone).await?;
                let credited =
                    UserEntity::credit_balance(&mm, &actor, user.id(), amount, &description)
                        .await?
                        .ok_or(DatabaseError::Invalid(String::from("user disappeared")))?;
                println!("New balance of {}: {}", phone, credited.balance());
            }
        },

        Commands::Course { action } => match action {
            CourseCommands::Add {
                owner_phone,
                title,
                description,
                price,
            } => {
                let owner = user_by_phone(&mm, &actor, &owner_phone).await?;
                if owner.role() == UserRole::Student {
                    return Err(DatabaseError::Invalid(String::from(
                        "course owner must be a teacher or an admin",
                    ))
                    .into());
                }
                if price < 0 {
                    return Err(DatabaseError::Invalid(String::from("price must not be negative")).into());
                }

                let course = Course::create(
                    &mm,
                    &actor,
                    CourseCreate {
                        owner_id: owner.id(),
                        title,
                        description,
                        image_url: None,
                        price,
                        is_published: false,
                    },
                )
                .await?;
                println!("Course created: {:?}", course);
            }
        },

        Commands::Chapter { action } => match action {
            ChapterCommands::Add {
                course_title,
                title,
                description,
                video_url,
                free,
                published,
            } => {
                let course = course_by_title(&mm, &course_title).await?;
                let draft = ChapterUpdateBody {
                    title,
                    description,
                    video_url,
                    is_free: free,
                    is_published: published,
                };
                draft.validate().map_err(DatabaseError::Invalid)?;

                let chapter = Chapter::create(
                    &mm,
                    &actor,
                    ChapterCreate {
                        course_id: course.id(),
                        title: draft.title,
                        description: draft.description,
                        video_url: draft.video_url,
                        is_published: draft.is_published,
                        is_free: draft.is_free,
                    },
                )
                .await?;
                println!("Chapter created: {:?}", chapter);
            }
        },

        Commands::Codes { action } => match action {
            CodesCommands::Generate {
                course_title,
                count,
            } => {
                let course = course_by_title(&mm, &course_title).await?;
                let owner = AuthenticatedUser::new(course.owner_id(), UserRole::Teacher);
                let codes = PurchaseCode::generate(&mm, &owner, course.id(), count).await?;
                for code in codes {
                    println!("{}", code.code());
                }
            }
        },
    }

    Ok(())
}
