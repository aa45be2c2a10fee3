#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    Vi,
}

impl Locale {
    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Vi => "vi",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "en" => Some(Self::En),
            "vi" => Some(Self::Vi),
            _ => None,
        }
    }

    /// The app knows exactly two locales, so switching language is a flip.
    pub fn toggled(self) -> Self {
        match self {
            Self::En => Self::Vi,
            Self::Vi => Self::En,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    locale: Locale,
}

impl Catalog {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    pub fn locale(self) -> Locale {
        self.locale
    }

    /// Look a key up in the active locale, falling back to English, then to
    /// the key itself so a missing entry stays visible instead of vanishing.
    pub fn text(self, key: &str) -> &'static str {
        let table = match self.locale {
            Locale::En => EN,
            Locale::Vi => VI,
        };
        lookup(table, key)
            .or_else(|| lookup(EN, key))
            .unwrap_or("<missing>")
    }
}

fn lookup(table: &'static [(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, value)| *value)
}

const EN: &[(&str, &str)] = &[
    ("header.task", "Task"),
    ("header.priority", "Priority"),
    ("header.dates", "Dates"),
    ("header.due", "Due"),
    ("header.category", "Category"),
    ("priority.low", "Low"),
    ("priority.medium", "Medium"),
    ("priority.high", "High"),
    ("priority.unknown", "-"),
    ("badge.overdue", "Overdue"),
    ("badge.due_soon", "Due soon"),
    ("category.none", "No category"),
    ("list.empty", "No tasks to show."),
    ("list.page", "Page"),
    ("confirm.delete", "Are you sure you want to delete this task?"),
    ("prompt.category", "Edit category"),
    ("prompt.text", "Task description"),
    ("prompt.priority", "Priority (low/medium/high)"),
    ("prompt.start", "Start date (YYYY-MM-DD)"),
    ("prompt.end", "End date (YYYY-MM-DD)"),
    ("msg.added", "Task added."),
    ("msg.updated", "Task updated."),
    ("msg.deleted", "Task deleted."),
    ("msg.unchanged", "Nothing changed."),
    ("msg.no_such_row", "No such row on this page."),
    ("msg.invalid_input", "Invalid value, try again."),
    ("msg.text_required", "Task description must not be empty."),
    ("msg.no_categories", "No categories yet."),
    ("msg.language", "Language"),
    ("msg.theme", "Theme"),
    ("theme.light", "light"),
    ("theme.dark", "dark"),
    (
        "help.body",
        "Commands:\n  \
         add <text> [pri:<p>] [start:<date>] [end:<date>] [cat:<c>]\n  \
         list                     show the task list\n  \
         toggle <row>             flip a task's completion state\n  \
         edit <row>               edit a task field by field\n  \
         category <row>           edit a task's category\n  \
         delete <row>             delete a task (asks first)\n  \
         search [text]            filter by text, no argument clears\n  \
         filter [key:value ...]   text:/pri:/status:/cat:/sort:, 'all' clears a key\n  \
         page <n>                 jump to a page\n  \
         categories               list known categories\n  \
         lang                     switch language\n  \
         theme                    switch dark mode\n  \
         quit                     exit",
    ),
];

const VI: &[(&str, &str)] = &[
    ("header.task", "Công việc"),
    ("header.priority", "Ưu tiên"),
    ("header.dates", "Thời gian"),
    ("header.due", "Hạn"),
    ("header.category", "Danh mục"),
    ("priority.low", "Thấp"),
    ("priority.medium", "Trung bình"),
    ("priority.high", "Cao"),
    ("priority.unknown", "-"),
    ("badge.overdue", "Quá hạn"),
    ("badge.due_soon", "Sắp đến hạn"),
    ("category.none", "Không có danh mục"),
    ("list.empty", "Không có công việc nào."),
    ("list.page", "Trang"),
    ("confirm.delete", "Bạn có chắc muốn xóa công việc này?"),
    ("prompt.category", "Sửa danh mục"),
    ("prompt.text", "Nội dung công việc"),
    ("prompt.priority", "Ưu tiên (low/medium/high)"),
    ("prompt.start", "Ngày bắt đầu (YYYY-MM-DD)"),
    ("prompt.end", "Ngày kết thúc (YYYY-MM-DD)"),
    ("msg.added", "Đã thêm công việc."),
    ("msg.updated", "Đã cập nhật công việc."),
    ("msg.deleted", "Đã xóa công việc."),
    ("msg.unchanged", "Không có gì thay đổi."),
    ("msg.no_such_row", "Không có dòng này trên trang."),
    ("msg.invalid_input", "Giá trị không hợp lệ, thử lại."),
    ("msg.text_required", "Nội dung công việc không được để trống."),
    ("msg.no_categories", "Chưa có danh mục nào."),
    ("msg.language", "Ngôn ngữ"),
    ("msg.theme", "Giao diện"),
    ("theme.light", "sáng"),
    ("theme.dark", "tối"),
    (
        "help.body",
        "Lệnh:\n  \
         add <nội dung> [pri:<p>] [start:<ngày>] [end:<ngày>] [cat:<dm>]\n  \
         list                     hiển thị danh sách công việc\n  \
         toggle <dòng>            đổi trạng thái hoàn thành\n  \
         edit <dòng>              sửa công việc theo từng trường\n  \
         category <dòng>          sửa danh mục của công việc\n  \
         delete <dòng>            xóa công việc (có xác nhận)\n  \
         search [từ khóa]         lọc theo nội dung, bỏ trống để xóa lọc\n  \
         filter [key:value ...]   text:/pri:/status:/cat:/sort:, 'all' để bỏ\n  \
         page <n>                 chuyển trang\n  \
         categories               liệt kê danh mục\n  \
         lang                     đổi ngôn ngữ\n  \
         theme                    đổi chế độ tối\n  \
         quit                     thoát",
    ),
];
