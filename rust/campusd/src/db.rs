use rusqlite::Connection;
use std::path::Path;
use tracing::info;

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join("campus.sqlite3");
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id TEXT PRIMARY KEY,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            email TEXT NOT NULL,
            grade TEXT NOT NULL,
            age INTEGER NOT NULL,
            enrollment_date TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS facilities(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            type TEXT NOT NULL,
            location TEXT NOT NULL,
            capacity INTEGER NOT NULL,
            is_available INTEGER NOT NULL,
            description TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS courses(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            code TEXT NOT NULL,
            instructor TEXT NOT NULL,
            students INTEGER NOT NULL,
            max_students INTEGER NOT NULL,
            schedule TEXT NOT NULL,
            duration TEXT NOT NULL,
            status TEXT NOT NULL,
            description TEXT NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL
        )",
        [],
    )?;

    // One record per (student, date); marking again rewrites the status.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS attendance(
            id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL,
            date TEXT NOT NULL,
            status TEXT NOT NULL,
            subject TEXT NOT NULL,
            FOREIGN KEY(student_id) REFERENCES students(id),
            UNIQUE(student_id, date)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_attendance_date ON attendance(date)",
        [],
    )?;

    seed_if_empty(&conn)?;
    Ok(conn)
}

fn table_is_empty(conn: &Connection, table: &str) -> anyhow::Result<bool> {
    let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| {
        r.get(0)
    })?;
    Ok(n == 0)
}

fn seed_if_empty(conn: &Connection) -> anyhow::Result<()> {
    if table_is_empty(conn, "students")? {
        let students = [
            ("1", "John", "Doe", "john.doe@example.com", "A", 18, "2023-08-15"),
            ("2", "Jane", "Smith", "jane.smith@example.com", "B+", 17, "2023-09-01"),
            ("3", "Michael", "Johnson", "michael.j@example.com", "A-", 18, "2023-08-20"),
            ("4", "Emily", "Williams", "emily.w@example.com", "B", 17, "2023-09-05"),
            ("5", "David", "Brown", "david.brown@example.com", "A+", 19, "2023-08-10"),
        ];
        for s in students {
            conn.execute(
                "INSERT INTO students(id, first_name, last_name, email, grade, age, enrollment_date)
                 VALUES(?, ?, ?, ?, ?, ?, ?)",
                s,
            )?;
        }
        info!(target: "campusd::db", count = 5, "seeded students");
    }

    if table_is_empty(conn, "facilities")? {
        let facilities = [
            ("1", "Main Lecture Hall", "classroom", "Building A, Floor 1", 120, 1, "Tiered hall with projector and audio"),
            ("2", "Chemistry Lab", "laboratory", "Building B, Floor 2", 30, 1, "Fume hoods and bench stations"),
            ("3", "Central Library", "library", "Building C", 200, 0, "Quiet study areas and stacks"),
        ];
        for f in facilities {
            conn.execute(
                "INSERT INTO facilities(id, name, type, location, capacity, is_available, description)
                 VALUES(?, ?, ?, ?, ?, ?, ?)",
                f,
            )?;
        }
        info!(target: "campusd::db", count = 3, "seeded facilities");
    }

    if table_is_empty(conn, "courses")? {
        let courses = [
            ("1", "Advanced Mathematics", "MATH301", "Dr. Smith", 25, 30, "Mon, Wed, Fri 9:00 AM", "3 months", "active",
             "Advanced mathematical concepts including calculus and linear algebra", "2024-01-15", "2024-04-15"),
            ("2", "Physics Laboratory", "PHYS201", "Dr. Johnson", 18, 20, "Tue, Thu 2:00 PM", "4 months", "active",
             "Hands-on physics experiments and practical applications", "2024-02-01", "2024-05-31"),
            ("3", "Computer Science Fundamentals", "CS101", "Mr. Davis", 30, 35, "Mon, Wed 1:00 PM", "6 months", "active",
             "Introduction to programming and computer science concepts", "2024-01-01", "2024-06-30"),
            ("4", "Chemistry Basics", "CHEM101", "Dr. Wilson", 22, 25, "Tue, Fri 10:00 AM", "4 months", "completed",
             "Basic chemistry principles and laboratory techniques", "2023-09-01", "2023-12-31"),
        ];
        for c in courses {
            conn.execute(
                "INSERT INTO courses(id, name, code, instructor, students, max_students, schedule,
                                     duration, status, description, start_date, end_date)
                 VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                c,
            )?;
        }
        info!(target: "campusd::db", count = 4, "seeded courses");
    }

    Ok(())
}
